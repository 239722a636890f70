use std::borrow::Cow;

use crate::codec::CodecError;

use super::cursor::Cursor;

/// A markup token. Element and attribute names are local names: any
/// namespace prefix is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Start {
        name: &'a str,
        attributes: Vec<(&'a str, String)>,
        self_closing: bool,
        offset: usize,
    },
    End {
        name: &'a str,
        offset: usize,
    },
    /// Character data with entities decoded.
    Text(String),
}

impl Token<'_> {
    /// Value of attribute `key` on a start tag.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        match self {
            Token::Start { attributes, .. } => attributes
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}

/// Splits markup into tags and text. Comments, processing instructions and
/// declarations are skipped; CDATA sections become text.
pub struct Lexer<'a> {
    cur: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(markup: &'a str) -> Self {
        Self {
            cur: Cursor::new(markup),
        }
    }

    /// Byte offset of the next unread token.
    pub fn offset(&self) -> usize {
        self.cur.pos()
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>, CodecError> {
        loop {
            if self.cur.eof() {
                return Ok(None);
            }
            let start = self.cur.pos();

            if self.cur.eat(b"<!--") {
                self.skip_past("-->", start, "unterminated comment")?;
            } else if self.cur.eat(b"<![CDATA[") {
                let data = self
                    .cur
                    .take_until("]]>")
                    .ok_or_else(|| CodecError::markup(start, "unterminated CDATA section"))?;
                return Ok(Some(Token::Text(data.to_string())));
            } else if self.cur.eat(b"<?") {
                self.skip_past("?>", start, "unterminated processing instruction")?;
            } else if self.cur.eat(b"<!") {
                self.skip_past(">", start, "unterminated declaration")?;
            } else if self.cur.eat(b"</") {
                return self.end_tag(start).map(Some);
            } else if self.cur.eat(b"<") {
                return self.start_tag(start).map(Some);
            } else {
                let raw = self.cur.take_while(|b| b != b'<');
                return Ok(Some(Token::Text(decode(raw).into_owned())));
            }
        }
    }

    fn skip_past(&mut self, pat: &str, start: usize, reason: &str) -> Result<(), CodecError> {
        self.cur
            .take_until(pat)
            .map(|_| ())
            .ok_or_else(|| CodecError::markup(start, reason))
    }

    fn end_tag(&mut self, offset: usize) -> Result<Token<'a>, CodecError> {
        let name = self.name(offset)?;
        self.cur.skip_whitespace();
        if !self.cur.eat(b">") {
            return Err(CodecError::markup(
                self.cur.pos(),
                format!("expected '>' to close </{name}"),
            ));
        }
        Ok(Token::End { name, offset })
    }

    fn start_tag(&mut self, offset: usize) -> Result<Token<'a>, CodecError> {
        let name = self.name(offset)?;
        let mut attributes = Vec::new();

        loop {
            self.cur.skip_whitespace();
            if self.cur.eat(b"/>") {
                return Ok(Token::Start {
                    name,
                    attributes,
                    self_closing: true,
                    offset,
                });
            }
            if self.cur.eat(b">") {
                return Ok(Token::Start {
                    name,
                    attributes,
                    self_closing: false,
                    offset,
                });
            }
            if self.cur.eof() {
                return Err(CodecError::markup(offset, format!("unterminated <{name}> tag")));
            }
            attributes.push(self.attribute()?);
        }
    }

    fn attribute(&mut self) -> Result<(&'a str, String), CodecError> {
        let at = self.cur.pos();
        let key = self.name(at)?;
        self.cur.skip_whitespace();
        if !self.cur.eat(b"=") {
            return Err(CodecError::markup(
                self.cur.pos(),
                format!("expected '=' after attribute {key}"),
            ));
        }
        self.cur.skip_whitespace();

        let quote = match self.cur.bump() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(CodecError::markup(
                    self.cur.pos(),
                    format!("attribute {key} value must be quoted"),
                ));
            }
        };
        let delimiter = if quote == b'"' { "\"" } else { "'" };
        let value = self
            .cur
            .take_until(delimiter)
            .ok_or_else(|| CodecError::markup(at, format!("unterminated value for {key}")))?;
        Ok((key, decode(value).into_owned()))
    }

    /// Reads a qualified name and returns its local part.
    fn name(&mut self, offset: usize) -> Result<&'a str, CodecError> {
        let qualified = self
            .cur
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'-' | b'.'));
        if qualified.is_empty() {
            return Err(CodecError::markup(offset, "expected a name"));
        }
        Ok(qualified.rsplit(':').next().unwrap_or(qualified))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

fn decode(raw: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(raw)
}
