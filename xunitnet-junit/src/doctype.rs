// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Screening of document type declarations.
//!
//! The XML reader used in this crate never expands entities or loads DTDs. Documents that
//! attempt to use either are still refused outright, so that a report relying on them fails loudly
//! instead of being silently read differently from how its author intended.

use thiserror::Error;

/// A reason a document type declaration was refused.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum DoctypeViolation {
    /// The declaration references an external resource through a `SYSTEM` or `PUBLIC` identifier.
    #[error("document type declaration references external resource `{target}` via {keyword}")]
    ExternalIdentifier {
        /// The keyword that introduced the identifier.
        keyword: &'static str,

        /// The system literal (file path or URL), or the public literal if no system literal was
        /// given.
        target: String,
    },

    /// The declaration declares an entity.
    #[error("document type declaration declares entity `{name}`")]
    EntityDeclaration {
        /// The name of the entity, including a leading `%` for parameter entities.
        name: String,
    },
}

/// Checks the contents of a `<!DOCTYPE ...>` declaration.
///
/// `doctype` is the text between `<!DOCTYPE` and the closing `>`, including any internal subset.
/// A bare declaration such as `<!DOCTYPE assemblies>` is accepted.
pub fn screen_doctype(doctype: &[u8]) -> Result<(), DoctypeViolation> {
    let doctype = String::from_utf8_lossy(doctype);
    let tokens = tokenize(&doctype);

    let mut entity_name = None;
    let mut iter = tokens.iter().enumerate();
    while let Some((index, token)) = iter.next() {
        let Token::Word(word) = token else {
            continue;
        };

        let keyword = if word.eq_ignore_ascii_case("SYSTEM") {
            "SYSTEM"
        } else if word.eq_ignore_ascii_case("PUBLIC") {
            "PUBLIC"
        } else {
            if word.eq_ignore_ascii_case("<!ENTITY") && entity_name.is_none() {
                entity_name = Some(entity_name_at(&tokens[index + 1..]));
            }
            continue;
        };

        // The system literal is the last of the literals following the keyword.
        let target = tokens[index + 1..]
            .iter()
            .map_while(|token| match token {
                Token::Literal(literal) => Some(*literal),
                Token::Word(_) => None,
            })
            .last()
            .unwrap_or_default();
        return Err(DoctypeViolation::ExternalIdentifier {
            keyword,
            target: target.to_owned(),
        });
    }

    match entity_name {
        Some(name) => Err(DoctypeViolation::EntityDeclaration { name }),
        None => Ok(()),
    }
}

fn entity_name_at(tokens: &[Token<'_>]) -> String {
    match tokens {
        [Token::Word("%"), Token::Word(name), ..] => format!("%{name}"),
        [Token::Word(name), ..] => (*name).to_owned(),
        _ => String::new(),
    }
}

#[derive(Debug, Eq, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Literal(&'a str),
}

// Splits on whitespace and markup delimiters, keeping quoted literals intact so that keywords
// inside literals are not mistaken for real ones.
fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut word_start = None;
    let mut chars = input.char_indices();

    while let Some((index, c)) = chars.next() {
        match c {
            '"' | '\'' => {
                if let Some(start) = word_start.take() {
                    tokens.push(Token::Word(&input[start..index]));
                }
                let literal_start = index + c.len_utf8();
                let literal_end = chars
                    .by_ref()
                    .find(|&(_, other)| other == c)
                    .map_or(input.len(), |(end, _)| end);
                tokens.push(Token::Literal(&input[literal_start..literal_end]));
            }
            c if c.is_whitespace() || matches!(c, '[' | ']' | '>') => {
                if let Some(start) = word_start.take() {
                    tokens.push(Token::Word(&input[start..index]));
                }
            }
            _ => {
                word_start.get_or_insert(index);
            }
        }
    }
    if let Some(start) = word_start {
        tokens.push(Token::Word(&input[start..]));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(" assemblies" ; "bare")]
    #[test_case("assemblies [ <!ELEMENT assemblies ANY> ]" ; "element declaration")]
    #[test_case(" html \"SYSTEM\"" ; "keyword only inside a literal")]
    fn accepted(doctype: &str) {
        assert_eq!(screen_doctype(doctype.as_bytes()), Ok(()));
    }

    #[test_case(
        " assemblies SYSTEM \"https://example.invalid/evil.dtd\"",
        "SYSTEM",
        "https://example.invalid/evil.dtd"
        ; "network dtd"
    )]
    #[test_case(
        " assemblies PUBLIC \"-//EVIL//DTD//EN\" 'http://example.invalid/x.dtd'",
        "PUBLIC",
        "http://example.invalid/x.dtd"
        ; "public identifier"
    )]
    #[test_case(
        " assemblies [ <!ENTITY xxe SYSTEM \"file:///etc/passwd\"> ]",
        "SYSTEM",
        "file:///etc/passwd"
        ; "external entity"
    )]
    #[test_case(
        " a [<!ENTITY % remote system '/tmp/secret'>%remote;]",
        "SYSTEM",
        "/tmp/secret"
        ; "lowercase keyword in parameter entity"
    )]
    fn external_identifier(doctype: &str, keyword: &'static str, target: &str) {
        assert_eq!(
            screen_doctype(doctype.as_bytes()),
            Err(DoctypeViolation::ExternalIdentifier {
                keyword,
                target: target.to_owned(),
            })
        );
    }

    #[test_case(" a [ <!ENTITY lol \"lol\"> ]", "lol" ; "internal entity")]
    #[test_case(" a [<!ENTITY % pe \"x\">]", "%pe" ; "parameter entity")]
    fn entity_declaration(doctype: &str, name: &str) {
        assert_eq!(
            screen_doctype(doctype.as_bytes()),
            Err(DoctypeViolation::EntityDeclaration {
                name: name.to_owned(),
            })
        );
    }
}
