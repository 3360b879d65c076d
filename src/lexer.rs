//! DSQL的词法分析器
//!
//! 词法分析器从不失败：无法识别的字符或未闭合的字面量都会产生 `Illegal` token，
//! 由语法分析器转换为错误标记节点。

use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 返回下一个位置的字符，不推进位置
    fn peek_next(&self) -> Option<char> {
        self.input[self.position..].chars().nth(1)
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind<'a>, start: usize) -> Token<'a> {
        Token::new(kind, Span::new(start, self.position))
    }

    fn skip_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 读取数字、日期或日期时间字面量
    /// 注意：第一个字符（数字或负号）已经被调用者消费
    fn read_number(&mut self, start: usize) -> Token<'a> {
        if let Some(len) = date_time_len(&self.input[start..]) {
            self.position = start + len;
            let text = &self.input[start..self.position];
            let kind = if len > DATE_LEN {
                TokenKind::DateTime(text)
            } else {
                TokenKind::Date(text)
            };
            return self.token(kind, start);
        }

        self.skip_digits();
        let is_decimal = self.peek() == Some('.')
            && self.peek_next().is_some_and(|c| c.is_ascii_digit());
        if is_decimal {
            self.bump(); // 消费 '.'
            self.skip_digits();
            let text = &self.input[start..self.position];
            return self.token(TokenKind::Decimal(text), start);
        }

        let text = &self.input[start..self.position];
        self.token(TokenKind::Integer(text), start)
    }

    /// 读取单引号或双引号包围的字符串字面量
    /// 注意：开始的引号已经被调用者消费；转义的引号原样保留
    fn read_string(&mut self, start: usize, quote: char) -> Token<'a> {
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump(); // 消费被转义的字符
                }
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.bump(); // 成对的引号
                    } else {
                        let text = &self.input[start..self.position];
                        return self.token(TokenKind::String(text), start);
                    }
                }
                Some(_) => {}
                None => {
                    let text = &self.input[start..self.position];
                    return self.token(TokenKind::Illegal(text), start);
                }
            }
        }
    }

    /// 读取宿主表达式 `#[ ... ]`，括号需要配对，内容不做任何解析
    /// 注意：'#' 已经被调用者消费
    fn read_host_expression(&mut self, start: usize) -> Token<'a> {
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        let text = &self.input[start..self.position];
                        return self.token(TokenKind::HostExpression(text), start);
                    }
                }
                _ => {}
            }
        }
        let text = &self.input[start..self.position];
        self.token(TokenKind::Illegal(text), start)
    }

    /// 读取标识符或关键字
    /// 标识符可以包含字母、数字、下划线和点号
    fn read_identifier(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.bump();
            } else {
                break;
            }
        }
        let literal = &self.input[start..self.position];
        self.token(match_keyword(literal), start)
    }
}

const DATE_LEN: usize = "YYYY-MM-DD".len();

/// 若输入以 `YYYY-MM-DD` 开头（可选跟随 `Thh:mm:ss[.fff][Z|±hh:mm]`），返回其字节长度
fn date_time_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    if !matches_pattern(bytes, b"dddd-dd-dd") {
        return None;
    }
    let mut len = DATE_LEN;
    if bytes.get(len) != Some(&b'T') || !matches_pattern(&bytes[len + 1..], b"dd:dd:dd") {
        return Some(len);
    }
    len += "Thh:mm:ss".len();

    if bytes.get(len) == Some(&b'.') && bytes.get(len + 1).is_some_and(u8::is_ascii_digit) {
        len += 1;
        while bytes.get(len).is_some_and(u8::is_ascii_digit) {
            len += 1;
        }
    }
    match bytes.get(len) {
        Some(b'Z') => len += 1,
        Some(b'+') | Some(b'-') if matches_pattern(&bytes[len + 1..], b"dd:dd") => {
            len += "+hh:mm".len();
        }
        _ => {}
    }
    Some(len)
}

/// `d` 匹配任意ASCII数字，其余字节需完全相等
fn matches_pattern(bytes: &[u8], pattern: &[u8]) -> bool {
    bytes.len() >= pattern.len()
        && pattern.iter().zip(bytes).all(|(p, b)| match p {
            b'd' => b.is_ascii_digit(),
            _ => p == b,
        })
}

fn match_keyword(s: &str) -> TokenKind<'_> {
    match s.to_ascii_lowercase().as_str() {
        "select" => TokenKind::Select,
        "from" => TokenKind::From,
        "where" => TokenKind::Where,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "order" => TokenKind::Order,
        "by" => TokenKind::By,
        "asc" | "ascending" => TokenKind::Asc,
        "desc" | "descending" => TokenKind::Desc,
        "limit" => TokenKind::Limit,
        "offset" => TokenKind::Offset,
        "like" => TokenKind::Like,
        "null" => TokenKind::Null,
        "true" | "false" => TokenKind::Boolean(s),
        _ => TokenKind::Identifier(s),
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.position;

        let c = self.bump()?; // 到达输入末尾时返回 None

        let token = match c {
            '=' => self.token(TokenKind::Eq, start),
            '*' => self.token(TokenKind::Star, start),
            ',' => self.token(TokenKind::Comma, start),
            '(' => self.token(TokenKind::LParen, start),
            ')' => self.token(TokenKind::RParen, start),
            '<' => match self.peek() {
                Some('=') => {
                    self.bump();
                    self.token(TokenKind::Lte, start)
                }
                Some('>') => {
                    self.bump();
                    self.token(TokenKind::NotEq, start)
                }
                _ => self.token(TokenKind::Lt, start),
            },
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    self.token(TokenKind::Gte, start)
                } else {
                    self.token(TokenKind::Gt, start)
                }
            }
            '!' if self.peek() == Some('=') => {
                self.bump();
                self.token(TokenKind::NotEq, start)
            }
            '#' if self.peek() == Some('[') => self.read_host_expression(start),
            '\'' | '"' => self.read_string(start, c),
            '-' if self.peek().is_some_and(|n| n.is_ascii_digit()) => self.read_number(start),
            c if c.is_ascii_digit() => self.read_number(start),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(start),
            _ => {
                let text = &self.input[start..self.position];
                self.token(TokenKind::Illegal(text), start)
            }
        };
        Some(token)
    }
}
