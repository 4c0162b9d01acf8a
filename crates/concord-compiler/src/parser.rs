//! Configuration dialect parser.
//!
//! Parses block-structured configuration text into a
//! [`ConfigurationDocument`]. The grammar covers top-level blocks
//! (`blockType "label" ["label2"] { body }`), nested blocks, `key = value`
//! assignments and literal values (strings, numbers, booleans, lists, object
//! literals and whole-value references). The expression language
//! (conditionals, function calls, string interpolation) is not supported in
//! values that are read. Parenthesised expressions are tolerated where the
//! value is discarded: in skipped blocks and in variable attributes other
//! than `default` (e.g. `type = list(string)`).

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::document::{
    AttributeValue, Block, Body, ConfigurationDocument, LocalDefinition, ResourceBlock,
    VariableDefinition, POLICY_RESOURCE_TYPE,
};
use crate::error::{CompilerError, Result};
use crate::lexer::{strip_comments, tokenize, Token, TokenKind};

/// Parser for configuration files.
///
/// Only `resource` blocks whose type matches the configured resource type
/// are retained; `variable`, `locals` and `data` blocks are collected for
/// reference resolution; other top-level blocks are skipped.
///
/// # Examples
///
/// ```rust
/// use concord_compiler::ConfigParser;
///
/// let doc = ConfigParser::new()
///     .parse_source(
///         r#"
///         resource "azuread_conditional_access_policy" "mfa" {
///           display_name = "Require MFA"
///           state        = "enabled"
///         }
///         "#,
///         "main.tf",
///     )
///     .unwrap();
/// assert_eq!(doc.resources.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigParser {
    /// Resource type retained from `resource` blocks.
    resource_type: String,
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParser {
    /// Creates a parser that retains conditional access policy resources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resource_type: POLICY_RESOURCE_TYPE.to_string(),
        }
    }

    /// Sets the resource type retained from `resource` blocks.
    #[must_use]
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }

    /// Parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ConfigurationDocument> {
        let path = path.as_ref();
        debug!(?path, "Parsing configuration file");

        let source = fs::read_to_string(path).map_err(|e| CompilerError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.parse_source(&source, path.to_string_lossy().as_ref())
    }

    /// Parses configuration text.
    ///
    /// # Arguments
    ///
    /// * `source` - Configuration text
    /// * `file_name` - Name of the source (for error messages)
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::ParseError`] on malformed text, including
    /// unbalanced braces, brackets or quotes. No partial document is returned.
    pub fn parse_source(&self, source: &str, file_name: &str) -> Result<ConfigurationDocument> {
        let stripped = strip_comments(source, file_name)?;
        let tokens = tokenize(&stripped, file_name)?;
        let mut stream = TokenStream::new(tokens, file_name);
        let mut document = ConfigurationDocument::default();

        while let Some(token) = stream.next() {
            let TokenKind::Ident(keyword) = &token.kind else {
                return Err(stream.error_at(
                    &token,
                    format!("expected a block or attribute, found {}", token.kind.describe()),
                ));
            };

            if stream.eat_assignment() {
                let _ = stream.parse_value(true)?;
                debug!(file = %file_name, attribute = %keyword, "Skipping top-level attribute");
                continue;
            }

            let labels = stream.parse_labels();
            let open = stream.expect_open_brace()?;
            let body = stream.parse_body(&open, self.expressions_in(keyword, &labels))?;
            self.collect_block(&mut document, &stream, &token, &labels, body)?;
        }

        debug!(
            file = %file_name,
            resources = document.resources.len(),
            variables = document.variables.len(),
            locals = document.locals.len(),
            data_sources = document.data_sources.len(),
            "Parsed configuration"
        );
        Ok(document)
    }

    /// Where a top-level block body may hold parenthesised expressions.
    fn expressions_in(&self, keyword: &str, labels: &[String]) -> Expressions {
        match keyword {
            "resource" if labels.first() == Some(&self.resource_type) => Expressions::Rejected,
            "locals" => Expressions::Rejected,
            "variable" => Expressions::ExceptDefault,
            _ => Expressions::Ignored,
        }
    }

    fn collect_block(
        &self,
        document: &mut ConfigurationDocument,
        stream: &TokenStream<'_>,
        token: &Token,
        labels: &[String],
        body: Body,
    ) -> Result<()> {
        let TokenKind::Ident(keyword) = &token.kind else {
            return Ok(());
        };
        match keyword.as_str() {
            "resource" => {
                let [resource_type, name] = labels else {
                    return Err(stream.error_at(
                        token,
                        "resource block requires a type label and a name label",
                    ));
                };
                if *resource_type != self.resource_type {
                    debug!(%resource_type, %name, "Skipping resource of other type");
                    return Ok(());
                }
                body.for_each_reference(&mut |r| document.record_data_access(r));
                document.upsert_resource(ResourceBlock {
                    resource_type: resource_type.clone(),
                    name: name.clone(),
                    body,
                    line: token.line,
                });
            }
            "variable" => {
                let [name] = labels else {
                    return Err(stream.error_at(token, "variable block requires one name label"));
                };
                document.upsert_variable(VariableDefinition {
                    name: name.clone(),
                    default_value: body.attribute("default").cloned(),
                });
            }
            "locals" => {
                for attribute in body.attributes {
                    attribute
                        .value
                        .for_each_reference(&mut |r| document.record_data_access(r));
                    document.upsert_local(LocalDefinition {
                        name: attribute.name,
                        value: attribute.value,
                    });
                }
            }
            "data" => {
                let [kind, name] = labels else {
                    return Err(stream.error_at(
                        token,
                        "data block requires a kind label and a name label",
                    ));
                };
                document.declare_data_source(kind, name);
            }
            other => {
                debug!(block_type = %other, "Skipping unsupported top-level block");
            }
        }
        Ok(())
    }
}

/// Recognizes a string that is exactly one `${reference}` interpolation.
fn whole_interpolation(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("${")?.strip_suffix('}')?.trim();
    let is_reference = !inner.is_empty()
        && inner
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '[' | ']' | '*'));
    is_reference.then_some(inner)
}

/// Which attribute values of a body may be opaque expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expressions {
    /// Every value is read.
    Rejected,
    /// Only `default` is read.
    ExceptDefault,
    /// Nothing is read.
    Ignored,
}

impl Expressions {
    fn allowed_for(self, key: &str) -> bool {
        match self {
            Self::Rejected => false,
            Self::ExceptDefault => key != "default",
            Self::Ignored => true,
        }
    }

    const fn nested(self) -> Self {
        match self {
            Self::Rejected => Self::Rejected,
            Self::ExceptDefault | Self::Ignored => Self::Ignored,
        }
    }
}

struct TokenStream<'a> {
    tokens: Vec<Token>,
    pos: usize,
    file: &'a str,
}

impl<'a> TokenStream<'a> {
    const fn new(tokens: Vec<Token>, file: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            file,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> CompilerError {
        CompilerError::ParseError {
            file: self.file.to_string(),
            line: token.line,
            column: token.column,
            message: message.into(),
        }
    }

    fn eof_error(&self, message: impl Into<String>) -> CompilerError {
        let (line, column) = self
            .tokens
            .last()
            .map_or((1, 1), |t| (t.line, t.column));
        CompilerError::ParseError {
            file: self.file.to_string(),
            line,
            column,
            message: format!("unexpected end of input: {}", message.into()),
        }
    }

    /// Consumes `=` or `:` if it is the next token.
    fn eat_assignment(&mut self) -> bool {
        if matches!(
            self.peek().map(|t| &t.kind),
            Some(TokenKind::Equals | TokenKind::Colon)
        ) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_labels(&mut self) -> Vec<String> {
        let mut labels = Vec::new();
        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Str(s) | TokenKind::Ident(s) => {
                    labels.push(s.clone());
                    self.pos += 1;
                }
                _ => break,
            }
        }
        labels
    }

    fn expect_open_brace(&mut self) -> Result<Token> {
        match self.next() {
            Some(token) if token.kind == TokenKind::LBrace => Ok(token),
            Some(token) => Err(self.error_at(
                &token,
                format!("expected '{{' or '=', found {}", token.kind.describe()),
            )),
            None => Err(self.eof_error("expected '{'")),
        }
    }

    /// Parses block contents up to and including the matching `}`.
    fn parse_body(&mut self, open: &Token, expressions: Expressions) -> Result<Body> {
        let mut body = Body::default();
        loop {
            let Some(token) = self.next() else {
                return Err(self.eof_error(format!(
                    "unclosed '{{' opened at line {}, column {}",
                    open.line, open.column
                )));
            };
            match token.kind {
                TokenKind::RBrace => return Ok(body),
                TokenKind::Comma => {}
                TokenKind::Ident(ref key) | TokenKind::Str(ref key) => {
                    let key = key.clone();
                    if self.eat_assignment() {
                        let value = self.parse_value(expressions.allowed_for(&key))?;
                        body.set_attribute(key, value);
                    } else if matches!(token.kind, TokenKind::Ident(_)) {
                        let labels = self.parse_labels();
                        let nested_open = self.expect_open_brace()?;
                        let nested = self.parse_body(&nested_open, expressions.nested())?;
                        body.blocks.push(Block {
                            block_type: key,
                            labels,
                            body: nested,
                        });
                    } else {
                        return Err(self.error_at(&token, "expected '=' after quoted key"));
                    }
                }
                ref other => {
                    return Err(self.error_at(
                        &token,
                        format!("expected an attribute or block, found {}", other.describe()),
                    ))
                }
            }
        }
    }

    /// Parses one value; `opaque` admits a parenthesised expression, which
    /// is returned as null since its value is never read.
    fn parse_value(&mut self, opaque: bool) -> Result<AttributeValue> {
        let Some(token) = self.next() else {
            return Err(self.eof_error("expected a value"));
        };
        match token.kind {
            TokenKind::Str(ref s) => Ok(whole_interpolation(s).map_or_else(
                || AttributeValue::String(s.clone()),
                |r| AttributeValue::Reference(r.to_string()),
            )),
            TokenKind::Number(n) => Ok(AttributeValue::Number(n)),
            TokenKind::Ident(ref word) => Ok(match word.as_str() {
                "true" => AttributeValue::Bool(true),
                "false" => AttributeValue::Bool(false),
                "null" => AttributeValue::Null,
                _ => AttributeValue::Reference(word.clone()),
            }),
            TokenKind::Expr(_) if opaque => Ok(AttributeValue::Null),
            TokenKind::Expr(ref text) => Err(self.error_at(
                &token,
                format!("unsupported expression syntax '{text}'"),
            )),
            TokenKind::LBracket => self.parse_list(&token, opaque),
            TokenKind::LBrace => {
                let expressions = if opaque {
                    Expressions::Ignored
                } else {
                    Expressions::Rejected
                };
                Ok(AttributeValue::Object(self.parse_body(&token, expressions)?))
            }
            ref other => Err(self.error_at(
                &token,
                format!("expected a value, found {}", other.describe()),
            )),
        }
    }

    fn parse_list(&mut self, open: &Token, opaque: bool) -> Result<AttributeValue> {
        let mut items = Vec::new();
        loop {
            match self.peek().map(|t| &t.kind) {
                None => {
                    return Err(self.eof_error(format!(
                        "unclosed '[' opened at line {}, column {}",
                        open.line, open.column
                    )))
                }
                Some(TokenKind::RBracket) => {
                    self.pos += 1;
                    return Ok(AttributeValue::List(items));
                }
                Some(TokenKind::Comma) => self.pos += 1,
                Some(_) => items.push(self.parse_value(opaque)?),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<ConfigurationDocument> {
        ConfigParser::new().parse_source(source, "test.tf")
    }

    const FULL_POLICY: &str = r#"
# Conditional access policies
terraform {
  required_providers {
    azuread = { source = "hashicorp/azuread" }
  }
}

variable "policy_state" {
  type    = string
  default = "enabledForReportingButNotEnforced"
}

locals {
  break_glass = ["00000000-0000-0000-0000-000000000001"]
}

data "azuread_group" "admins" {
  display_name = "Admins"
}

resource "azuread_conditional_access_policy" "require_mfa" {
  display_name = "Require MFA" // inline comment
  state        = var.policy_state

  conditions {
    client_app_types = ["all"]

    applications {
      included_applications = ["All"]
    }

    users {
      included_users  = ["All"]
      excluded_users  = local.break_glass
      included_groups = [data.azuread_group.admins.object_id]
    }
  }

  /* grant */
  grant_controls {
    operator          = "OR"
    built_in_controls = ["mfa"]
  }
}

resource "azuread_group" "ignored" {
  display_name = "Not a policy"
}
"#;

    #[test]
    fn test_parse_full_document() {
        let doc = parse(FULL_POLICY).unwrap();

        assert_eq!(doc.resources.len(), 1);
        let resource = &doc.resources[0];
        assert_eq!(resource.name, "require_mfa");
        assert_eq!(
            resource.body.attribute("display_name"),
            Some(&AttributeValue::String("Require MFA".into()))
        );
        assert_eq!(
            resource.body.attribute("state"),
            Some(&AttributeValue::Reference("var.policy_state".into()))
        );

        let users = resource
            .body
            .section("conditions")
            .and_then(|c| c.section("users"))
            .unwrap();
        assert_eq!(
            users.attribute("excluded_users"),
            Some(&AttributeValue::Reference("local.break_glass".into()))
        );

        assert_eq!(doc.variables.len(), 1);
        assert_eq!(
            doc.variables[0].default_value,
            Some(AttributeValue::String(
                "enabledForReportingButNotEnforced".into()
            ))
        );
        assert_eq!(doc.locals.len(), 1);
        assert_eq!(doc.data_sources.len(), 1);
        assert!(doc.data_sources[0].declared);
        assert_eq!(
            doc.data_sources[0].accessed_paths,
            vec!["data.azuread_group.admins.object_id"]
        );
    }

    #[test]
    fn test_unbalanced_braces_fail_whole_file() {
        let source = r#"
resource "azuread_conditional_access_policy" "a" {
  display_name = "A"
}
resource "azuread_conditional_access_policy" "b" {
  display_name = "B"
  conditions {
    client_app_types = ["all"]
}
"#;
        let err = parse(source).unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("unclosed '{' opened at line 5"));
    }

    #[test]
    fn test_extra_closing_brace_fails() {
        let err = parse("locals {\n  a = 1\n}\n}\n").unwrap_err();
        match err {
            CompilerError::ParseError { line, message, .. } => {
                assert_eq!(line, 4);
                assert!(message.contains("'}'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_list_fails() {
        let err = parse("locals {\n  a = [\"x\", \"y\"\n}\n").unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_duplicates_last_wins() {
        let source = r#"
variable "v" { default = "first" }
variable "v" { default = "second" }
locals { a = 1 }
locals { a = 2 }
resource "azuread_conditional_access_policy" "p" { display_name = "old" }
resource "azuread_conditional_access_policy" "p" { display_name = "new" }
"#;
        let doc = parse(source).unwrap();
        assert_eq!(doc.variables.len(), 1);
        assert_eq!(
            doc.variables[0].default_value,
            Some(AttributeValue::String("second".into()))
        );
        assert_eq!(doc.local("a").map(|l| &l.value), Some(&AttributeValue::Number(2.0)));
        assert_eq!(doc.resources.len(), 1);
        assert_eq!(
            doc.resources[0].body.attribute("display_name"),
            Some(&AttributeValue::String("new".into()))
        );
    }

    #[test]
    fn test_whole_interpolation_is_reference() {
        let doc = parse(
            r#"resource "azuread_conditional_access_policy" "p" {
  display_name = "${var.name}"
  state        = "prefix-${var.name}"
}"#,
        )
        .unwrap();
        let body = &doc.resources[0].body;
        assert_eq!(
            body.attribute("display_name"),
            Some(&AttributeValue::Reference("var.name".into()))
        );
        assert_eq!(
            body.attribute("state"),
            Some(&AttributeValue::String("prefix-${var.name}".into()))
        );
    }

    #[test]
    fn test_unknown_blocks_and_top_level_attributes_are_skipped() {
        let doc = parse("provider \"azuread\" {\n  tenant_id = \"x\"\n}\nregion = \"eu\"\n").unwrap();
        assert_eq!(doc, ConfigurationDocument::default());
    }

    #[test]
    fn test_typed_variable_keeps_default() {
        let doc = parse(
            r#"
variable "excluded" {
  type    = list(string)
  default = ["a", "b"]
  validation {
    condition     = length(var.excluded) > 0
    error_message = "At least one."
  }
}
"#,
        )
        .unwrap();
        assert_eq!(doc.variables.len(), 1);
        assert_eq!(
            doc.variables[0].default_value,
            Some(AttributeValue::List(vec![
                AttributeValue::String("a".into()),
                AttributeValue::String("b".into()),
            ]))
        );
    }

    #[test]
    fn test_expressions_in_skipped_blocks_are_ignored() {
        let doc = parse(
            r#"
output "ids" {
  value = toset([for p in azuread_conditional_access_policy.all : p.id])
}
resource "azuread_group" "g" {
  owners = concat(["x"], local.owners)
}
data "azuread_groups" "all" {
  display_names = tolist(["A"])
}
resource "azuread_conditional_access_policy" "p" {
  display_name = "P"
}
"#,
        )
        .unwrap();
        assert_eq!(doc.resources.len(), 1);
        assert_eq!(doc.data_sources.len(), 1);
    }

    #[test]
    fn test_expressions_in_read_values_fail() {
        let err = parse(
            "resource \"azuread_conditional_access_policy\" \"p\" {\n  display_name = lower(\"P\")\n}\n",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse error in test.tf at line 2, column 18: unsupported expression syntax 'lower(\"P\")'"
        );

        assert!(parse("variable \"v\" {\n  default = upper(\"x\")\n}\n").is_err());
        assert!(parse("locals {\n  a = merge({}, {})\n}\n").is_err());
        assert!(parse("output \"o\" {\n  value = toset([\"a\"]\n}\n").is_err());
    }

    #[test]
    fn test_resource_without_name_label_fails() {
        let err = parse("resource \"azuread_conditional_access_policy\" {\n}\n").unwrap_err();
        assert!(err.to_string().contains("requires a type label and a name label"));
    }

    #[test]
    fn test_custom_resource_type() {
        let doc = ConfigParser::new()
            .with_resource_type("custom_policy")
            .parse_source("resource \"custom_policy\" \"x\" { state = \"enabled\" }", "x.tf")
            .unwrap();
        assert_eq!(doc.resources.len(), 1);
    }

    #[test]
    fn test_parse_file_missing() {
        let err = ConfigParser::new()
            .parse_file("/nonexistent/policies.tf")
            .unwrap_err();
        assert!(matches!(err, CompilerError::FileReadError { .. }));
    }
}
