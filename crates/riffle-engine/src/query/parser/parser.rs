//! Recursive-descent parser producing [`StructuredQuery`] values.

use riffle_common::types::Value;
use riffle_common::utils::error::{Error, Result};
use riffle_core::execution::operators::{AggregateFunction, CompareOp};

use super::lexer::{Lexer, Token, TokenKind};
use crate::query::structured::{
    PredicateRhs, QueryAggregation, QueryOperation, QueryPropertyPredicate, QueryRelation,
    QueryVariable, StructuredQuery,
};

/// Parses one statement.
///
/// # Errors
///
/// Returns [`Error::Parse`] on anything outside the restricted subset.
pub fn parse(text: &str) -> Result<StructuredQuery> {
    Parser::new(text)?.parse_statement()
}

/// Which clause a pattern appears in; CREATE patterns carry properties and
/// numeric IDs, MATCH patterns carry variables.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PatternContext {
    Create,
    Delete,
    Match,
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(text);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.unexpected(&format!("{kind:?}")))
        }
    }

    fn eat(&mut self, kind: TokenKind) -> Result<bool> {
        if self.current.kind == kind {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        Error::parse(format!(
            "expected {expected} but found {:?} at position {}",
            self.current.text, self.current.position
        ))
    }

    fn parse_statement(&mut self) -> Result<StructuredQuery> {
        let query = match self.current.kind {
            TokenKind::Create => {
                self.advance()?;
                let mut query = StructuredQuery::new(QueryOperation::Create);
                query.relations = self.parse_pattern_list(PatternContext::Create)?;
                query
            }
            TokenKind::Delete => {
                self.advance()?;
                let mut query = StructuredQuery::new(QueryOperation::Delete);
                query.relations = self.parse_pattern_list(PatternContext::Delete)?;
                query
            }
            TokenKind::Match => {
                self.advance()?;
                self.parse_match_body(false)?
            }
            TokenKind::Continuous => {
                self.advance()?;
                self.expect(TokenKind::Match)?;
                self.parse_match_body(true)?
            }
            _ => return Err(self.unexpected("CREATE, DELETE, MATCH or CONTINUOUS MATCH")),
        };
        self.eat(TokenKind::Semicolon)?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected("end of query"));
        }
        Ok(query)
    }

    fn parse_match_body(&mut self, continuous: bool) -> Result<StructuredQuery> {
        let operation = if continuous {
            QueryOperation::ContinuousMatch
        } else {
            QueryOperation::Match
        };
        let mut query = StructuredQuery::new(operation);
        query.relations = self.parse_pattern_list(PatternContext::Match)?;

        if self.eat(TokenKind::Where)? {
            query.predicates = self.parse_predicates()?;
        }
        if continuous {
            self.expect(TokenKind::File)?;
            let path = self.expect(TokenKind::Str)?;
            query.sink_path = Some(path.text);
        } else if self.eat(TokenKind::Return)? {
            self.parse_return_items(&mut query)?;
        }
        Ok(query)
    }

    fn parse_pattern_list(&mut self, context: PatternContext) -> Result<Vec<QueryRelation>> {
        let mut relations = Vec::new();
        loop {
            let mut from = self.parse_vertex(context)?;
            loop {
                let (edge_variable, edge_type, edge_properties) = self.parse_edge(context)?;
                let to = self.parse_vertex(context)?;
                relations.push(QueryRelation {
                    from,
                    to: to.clone(),
                    edge_type,
                    edge_variable,
                    edge_properties,
                });
                // A chained pattern reuses the destination as the next
                // source.
                if self.current.kind == TokenKind::Dash || self.current.kind == TokenKind::Arrow {
                    from = to;
                } else {
                    break;
                }
            }
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        Ok(relations)
    }

    fn parse_vertex(&mut self, context: PatternContext) -> Result<QueryVariable> {
        self.expect(TokenKind::LParen)?;
        let name = match self.current.kind {
            TokenKind::Identifier | TokenKind::Integer => self.advance()?.text,
            _ => return Err(self.unexpected("a variable or vertex ID")),
        };
        let vertex_type = if self.eat(TokenKind::Colon)? {
            Some(self.expect(TokenKind::Identifier)?.text)
        } else {
            None
        };
        let properties = if self.current.kind == TokenKind::LBrace {
            if context != PatternContext::Create {
                return Err(Error::parse(
                    "properties are only allowed in CREATE patterns",
                ));
            }
            self.parse_properties()?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::RParen)?;
        Ok(QueryVariable {
            name,
            vertex_type,
            properties,
        })
    }

    /// Parses `->` or `-[e:TYPE {props}]->` between two vertices.
    #[allow(clippy::type_complexity)]
    fn parse_edge(
        &mut self,
        context: PatternContext,
    ) -> Result<(Option<String>, Option<String>, Vec<(String, Value)>)> {
        if self.eat(TokenKind::Arrow)? {
            return Ok((None, None, Vec::new()));
        }
        self.expect(TokenKind::Dash)?;
        self.expect(TokenKind::LBracket)?;

        let edge_variable = if self.current.kind == TokenKind::Identifier {
            Some(self.advance()?.text)
        } else {
            None
        };
        let edge_type = if self.eat(TokenKind::Colon)? {
            Some(self.expect(TokenKind::Identifier)?.text)
        } else {
            None
        };
        let edge_properties = if self.current.kind == TokenKind::LBrace {
            if context != PatternContext::Create {
                return Err(Error::parse(
                    "properties are only allowed in CREATE patterns",
                ));
            }
            self.parse_properties()?
        } else {
            Vec::new()
        };

        self.expect(TokenKind::RBracket)?;
        self.expect(TokenKind::Arrow)?;
        Ok((edge_variable, edge_type, edge_properties))
    }

    fn parse_properties(&mut self) -> Result<Vec<(String, Value)>> {
        self.expect(TokenKind::LBrace)?;
        let mut properties = Vec::new();
        loop {
            let key = self.expect(TokenKind::Identifier)?.text;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_literal()?;
            properties.push((key, value));
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(properties)
    }

    fn parse_literal(&mut self) -> Result<Value> {
        let negative = self.eat(TokenKind::Dash)?;
        let token = self.advance()?;
        let value = match token.kind {
            TokenKind::Integer => {
                let text = if negative {
                    format!("-{}", token.text)
                } else {
                    token.text
                };
                Value::Int(text.parse::<i32>().map_err(|_| {
                    Error::parse(format!("integer literal {text} is out of range"))
                })?)
            }
            TokenKind::Float => {
                let text = if negative {
                    format!("-{}", token.text)
                } else {
                    token.text
                };
                Value::Double(text.parse::<f64>().map_err(|_| {
                    Error::parse(format!("malformed floating-point literal {text}"))
                })?)
            }
            TokenKind::Str if !negative => Value::from(token.text.as_str()),
            TokenKind::True if !negative => Value::Boolean(true),
            TokenKind::False if !negative => Value::Boolean(false),
            _ => {
                return Err(Error::parse(format!(
                    "expected a literal but found {:?} at position {}",
                    token.text, token.position
                )))
            }
        };
        Ok(value)
    }

    fn parse_predicates(&mut self) -> Result<Vec<QueryPropertyPredicate>> {
        let mut predicates = Vec::new();
        loop {
            let (variable, property) = self.parse_qualified_name()?;
            let op = match self.current.kind {
                TokenKind::Eq => CompareOp::Eq,
                TokenKind::NotEq => CompareOp::NotEq,
                TokenKind::Lt => CompareOp::Lt,
                TokenKind::Gt => CompareOp::Gt,
                TokenKind::Le => CompareOp::Le,
                TokenKind::Ge => CompareOp::Ge,
                _ => return Err(self.unexpected("a comparison operator")),
            };
            self.advance()?;
            let rhs = if self.current.kind == TokenKind::Identifier {
                let (rhs_variable, rhs_property) = self.parse_qualified_name()?;
                PredicateRhs::Property(rhs_variable, rhs_property)
            } else {
                PredicateRhs::Literal(self.parse_literal()?)
            };
            predicates.push(QueryPropertyPredicate {
                variable,
                property,
                op,
                rhs,
            });
            if !self.eat(TokenKind::And)? {
                break;
            }
        }
        Ok(predicates)
    }

    fn parse_qualified_name(&mut self) -> Result<(String, String)> {
        let variable = self.expect(TokenKind::Identifier)?.text;
        self.expect(TokenKind::Dot)?;
        let property = self.expect(TokenKind::Identifier)?.text;
        Ok((variable, property))
    }

    fn parse_return_items(&mut self, query: &mut StructuredQuery) -> Result<()> {
        loop {
            match self.current.kind {
                TokenKind::Count => {
                    self.advance()?;
                    self.expect(TokenKind::LParen)?;
                    self.expect(TokenKind::Star)?;
                    self.expect(TokenKind::RParen)?;
                    query.aggregations.push(QueryAggregation {
                        function: AggregateFunction::CountStar,
                        variable: None,
                        property: None,
                    });
                }
                TokenKind::Sum | TokenKind::Min | TokenKind::Max | TokenKind::Avg => {
                    let function = match self.current.kind {
                        TokenKind::Sum => AggregateFunction::Sum,
                        TokenKind::Min => AggregateFunction::Min,
                        TokenKind::Max => AggregateFunction::Max,
                        _ => AggregateFunction::Avg,
                    };
                    self.advance()?;
                    self.expect(TokenKind::LParen)?;
                    let variable = self.expect(TokenKind::Identifier)?.text;
                    let property = if self.eat(TokenKind::Dot)? {
                        Some(self.expect(TokenKind::Identifier)?.text)
                    } else {
                        None
                    };
                    self.expect(TokenKind::RParen)?;
                    query.aggregations.push(QueryAggregation {
                        function,
                        variable: Some(variable),
                        property,
                    });
                }
                TokenKind::Identifier => {
                    let variable = self.advance()?.text;
                    if self.eat(TokenKind::Dot)? {
                        let property = self.expect(TokenKind::Identifier)?.text;
                        query.return_property_pairs.push((variable, property));
                    } else {
                        query.return_variables.push(variable);
                    }
                }
                _ => return Err(self.unexpected("a RETURN item")),
            }
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_match_pattern() {
        let query = parse("MATCH (a)->(b),(b)->(c),(c)->(a);").unwrap();
        assert_eq!(query.operation, QueryOperation::Match);
        assert_eq!(query.relations.len(), 3);
        assert_eq!(query.relations[0].from.name, "a");
        assert_eq!(query.relations[2].to.name, "a");
        assert_eq!(query.relations[0].edge_type, None);
    }

    #[test]
    fn test_parse_typed_pattern_with_edge_variable() {
        let query = parse("MATCH (a)-[e:FOLLOWS]->(b) RETURN e;").unwrap();
        assert_eq!(query.relations[0].edge_type.as_deref(), Some("FOLLOWS"));
        assert_eq!(query.relations[0].edge_variable.as_deref(), Some("e"));
        assert_eq!(query.return_variables, vec!["e".to_string()]);
    }

    #[test]
    fn test_parse_chained_pattern() {
        let query = parse("MATCH (a)->(b)->(c);").unwrap();
        assert_eq!(query.relations.len(), 2);
        assert_eq!(query.relations[0].to.name, "b");
        assert_eq!(query.relations[1].from.name, "b");
    }

    #[test]
    fn test_parse_create_with_types_and_properties() {
        let query = parse(
            "CREATE (0:Person {name: 'alice', age: 30})-[:FOLLOWS {since: 2024}]->(1:Person);",
        )
        .unwrap();
        assert_eq!(query.operation, QueryOperation::Create);
        let relation = &query.relations[0];
        assert_eq!(relation.from.name, "0");
        assert_eq!(relation.from.vertex_type.as_deref(), Some("Person"));
        assert_eq!(
            relation.from.properties,
            vec![
                ("name".to_string(), Value::from("alice")),
                ("age".to_string(), Value::Int(30)),
            ]
        );
        assert_eq!(
            relation.edge_properties,
            vec![("since".to_string(), Value::Int(2024))]
        );
    }

    #[test]
    fn test_parse_delete() {
        let query = parse("DELETE (4)->(1);").unwrap();
        assert_eq!(query.operation, QueryOperation::Delete);
        assert_eq!(query.relations[0].from.name, "4");

        let query = parse("DELETE (0)-[:FOLLOWS]->(1);").unwrap();
        assert_eq!(query.relations[0].edge_type.as_deref(), Some("FOLLOWS"));
    }

    #[test]
    fn test_parse_where_and_return() {
        let query = parse(
            "MATCH (a)->(b) WHERE a.age > 30 AND a.name <> b.name RETURN a, b.name, COUNT(*);",
        )
        .unwrap();
        assert_eq!(query.predicates.len(), 2);
        assert_eq!(query.predicates[0].variable, "a");
        assert_eq!(query.predicates[0].op, CompareOp::Gt);
        assert_eq!(query.predicates[0].rhs, PredicateRhs::Literal(Value::Int(30)));
        assert_eq!(
            query.predicates[1].rhs,
            PredicateRhs::Property("b".to_string(), "name".to_string())
        );
        assert_eq!(query.return_variables, vec!["a".to_string()]);
        assert_eq!(
            query.return_property_pairs,
            vec![("b".to_string(), "name".to_string())]
        );
        assert_eq!(query.aggregations.len(), 1);
    }

    #[test]
    fn test_parse_continuous_match() {
        let query =
            parse("CONTINUOUS MATCH (a)-[:LIKES]->(b) FILE '/tmp/out.txt';").unwrap();
        assert_eq!(query.operation, QueryOperation::ContinuousMatch);
        assert_eq!(query.sink_path.as_deref(), Some("/tmp/out.txt"));
    }

    #[test]
    fn test_parse_aggregations() {
        let query = parse("MATCH (a)->(b) RETURN SUM(a.age), AVG(b.age), MIN(a.age);").unwrap();
        assert_eq!(query.aggregations.len(), 3);
        assert_eq!(query.aggregations[0].function, AggregateFunction::Sum);
        assert_eq!(query.aggregations[0].variable.as_deref(), Some("a"));
        assert_eq!(query.aggregations[0].property.as_deref(), Some("age"));
    }

    #[test]
    fn test_parse_negative_literals() {
        let query = parse("CREATE (0 {x: -5, y: -1.5})->(1);").unwrap();
        assert_eq!(
            query.relations[0].from.properties,
            vec![
                ("x".to_string(), Value::Int(-5)),
                ("y".to_string(), Value::Double(-1.5)),
            ]
        );
    }

    #[test]
    fn test_reject_malformed_input() {
        assert!(parse("MATCH (a)->;").is_err());
        assert!(parse("MATCH (a)->(b) extra;").is_err());
        assert!(parse("FROB (a)->(b);").is_err());
        assert!(parse("MATCH (a {k: 1})->(b);").is_err());
        assert!(parse("CONTINUOUS MATCH (a)->(b);").is_err());
    }
}
