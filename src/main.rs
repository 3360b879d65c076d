use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dsql::token::Span;
use dsql::{Backend, CompileError, DefaultTranslator, DsqlConfig, SeaQueryTranslator};

const HELP: &str = "\
输入 DSQL 语句，例如:
  SELECT name, age FROM Account WHERE age > 18 AND NOT name LIKE 'A%' ORDER BY name DESC LIMIT 10

命令:
  :backend <postgres|mysql|sqlite>   切换目标SQL方言
  :json                              切换是否打印查询模型(JSON)
  :help                              显示帮助
  :quit                              退出";

/// 加载配置，失败时使用默认配置
fn load_config() -> DsqlConfig {
    let path = DsqlConfig::default_path();
    match DsqlConfig::from_json_file(&path) {
        Ok(config) => {
            tracing::info!(
                path = %path.display(),
                backend = %config.backend,
                mappings = config.table_mapping.len(),
                "loaded configuration"
            );
            config
        }
        Err(e) => {
            tracing::warn!("{}, using default configuration", e);
            DsqlConfig::default()
        }
    }
}

/// 在出错位置下方画出 `^`，按字符而不是字节对齐
fn caret_line(source: &str, span: Span) -> String {
    let columns = |text: Option<&str>| text.map_or(0, |t| t.chars().count());
    let indent = columns(source.get(..span.start));
    let width = columns(source.get(span.start..span.end)).max(1);
    format!("{}{}", " ".repeat(indent), "^".repeat(width))
}

struct Session {
    translator: SeaQueryTranslator,
    show_json: bool,
}

impl Session {
    fn new(config: &DsqlConfig) -> Self {
        Self {
            translator: SeaQueryTranslator::from_config(config),
            show_json: false,
        }
    }

    fn run_query(&mut self, source: &str) -> Result<()> {
        let query = match dsql::parse(source) {
            Ok(query) => query,
            Err(e) => {
                if let CompileError::Syntax { span: Some(span), .. } = &e {
                    println!("  {}", source);
                    println!("  {}", caret_line(source, *span));
                }
                return Err(e.into());
            }
        };

        if self.show_json {
            println!("{}", serde_json::to_string_pretty(&query)?);
        }

        let canonical = query.translate(&mut DefaultTranslator::new())?;
        println!("dsql     : {}", canonical);

        let sql = query
            .translate(&mut self.translator)
            .with_context(|| format!("cannot translate for {}", self.translator.backend()))?;
        println!("{:<9}: {}", self.translator.backend().to_string(), sql);
        Ok(())
    }

    /// 处理一行输入，返回 false 表示退出
    fn handle(&mut self, line: &str) -> bool {
        let mut words = line.split_whitespace();
        match words.next() {
            Some(":quit") | Some(":q") => return false,
            Some(":help") => println!("{}", HELP),
            Some(":json") => {
                self.show_json = !self.show_json;
                println!("JSON 输出: {}", if self.show_json { "开" } else { "关" });
            }
            Some(":backend") => match words.next().map(str::parse::<Backend>) {
                Some(Ok(backend)) => {
                    self.translator.set_backend(backend);
                    println!("目标方言: {}", backend);
                }
                Some(Err(e)) => println!("✗ {}", e),
                None => println!("目标方言: {}", self.translator.backend()),
            },
            Some(cmd) if cmd.starts_with(':') => println!("✗ 未知命令 {}，输入 :help 查看帮助", cmd),
            _ => {
                if let Err(e) = self.run_query(line) {
                    println!("✗ {:#}", e);
                }
            }
        }
        true
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dsql=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config();
    let mut session = Session::new(&config);

    // 命令行参数作为单条语句执行
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return session.run_query(&args.join(" "));
    }

    println!("--- DSQL 编译器 (目标方言: {}) ---", config.backend);
    println!("输入 :help 查看帮助");

    let mut editor = DefaultEditor::new().context("failed to initialise line editor")?;
    loop {
        match editor.readline("dsql> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;
                if !session.handle(line) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        }
    }
    Ok(())
}
