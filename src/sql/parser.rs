//! Command discrimination and argument capture.
//!
//! The parser walks the token stream accumulating keywords until the
//! prefix identifies a command head (`CREATE TABLE`, `SELECT`,
//! `INSERT INTO`, `DELETE FROM`, `UPDATE`), then hands the remaining
//! tokens to that command's capture routine. Anything that looks like a
//! `field OP value` triple goes through the shared equation helper.

use eyre::{bail, ensure, eyre, Result};
use hashbrown::HashSet;

use super::ast::{
    Assignment, CreateTableArgs, DeleteArgs, InsertArgs, JoinClause, JoinLocation, SelectArgs,
    Statement, UpdateArgs, WhereClause,
};
use super::lexer::tokenize;
use super::token::{Keyword, Token};
use crate::storage::Operator;
use crate::types::{Field, Primitive};

/// Parses one SQL statement into a typed command.
pub fn parse(statement: &str) -> Result<Statement> {
    let mut tokens = tokenize(statement)?;

    // trailing semicolon is optional and ignored
    if matches!(tokens.last(), Some(Token::SymbolGroup(s)) if s == ";") {
        tokens.pop();
    }
    ensure!(!tokens.is_empty(), "empty statement");

    let mut keywords = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if let Some(keyword) = token.keyword() {
            keywords.push(keyword);
        }
        if let Some(head) = command_head(&keywords) {
            let args = &tokens[i + 1..];
            return match head {
                Head::CreateTable => capture_create_table(args),
                Head::Select => capture_select(args),
                Head::Insert => capture_insert(args),
                Head::Delete => capture_delete(args),
                Head::Update => capture_update(args),
            };
        }
    }

    bail!("statement is not evaluable");
}

/// Checks that a statement parses, without executing it.
pub fn validate(statement: &str) -> Result<()> {
    parse(statement).map(|_| ())
}

enum Head {
    CreateTable,
    Select,
    Insert,
    Delete,
    Update,
}

/// Decides whether the accumulated keyword prefix names a command.
fn command_head(keywords: &[Keyword]) -> Option<Head> {
    match keywords.first()? {
        Keyword::Create => {
            (keywords.len() > 1 && keywords[1] == Keyword::Table).then_some(Head::CreateTable)
        }
        Keyword::Select => Some(Head::Select),
        Keyword::Insert => {
            (keywords.len() > 1 && keywords[1] == Keyword::Into).then_some(Head::Insert)
        }
        Keyword::Delete => {
            (keywords.len() > 1 && keywords[1] == Keyword::From).then_some(Head::Delete)
        }
        Keyword::Update => Some(Head::Update),
        _ => None,
    }
}

fn capture_create_table(args: &[Token]) -> Result<Statement> {
    ensure!(args.len() >= 2, "not enough arguments for CREATE TABLE");

    let table = expect_value(args, 0, "table name")?;
    let body = match &args[1] {
        Token::ParenGroup(body) => body,
        other => bail!("invalid fields declaration: {}", other.text()),
    };
    ensure!(
        args.len() == 2,
        "unexpected trailing input after CREATE TABLE"
    );

    let fields = split_group_items(body)
        .iter()
        .map(|item| parse_field_decl(item))
        .collect::<Result<Vec<_>>>()?;

    Ok(Statement::CreateTable(CreateTableArgs { table, fields }))
}

/// Parses one `name type` pair from a CREATE TABLE column list.
fn parse_field_decl(item: &str) -> Result<Field> {
    let parts: Vec<&str> = item.split_whitespace().collect();
    ensure!(parts.len() == 2, "invalid field declaration: \"{}\"", item);

    Ok(Field::new(parts[0], Primitive::parse_keyword(parts[1])?))
}

fn capture_insert(args: &[Token]) -> Result<Statement> {
    let table = expect_value(args, 0, "table name")?;
    let mut i = 1;

    let columns = match args.get(i) {
        Some(Token::ParenGroup(body)) => {
            i += 1;
            let names = split_group_items(body);
            let mut seen = HashSet::new();
            for name in &names {
                ensure!(
                    seen.insert(name.as_str()),
                    "cannot insert into the same column twice: {}",
                    name
                );
            }
            drop(seen);
            Some(names)
        }
        _ => None,
    };

    ensure!(
        args.get(i).is_some_and(|t| t.is_keyword(Keyword::Values)),
        "INSERT requires a VALUES clause"
    );
    i += 1;

    let body = match args.get(i) {
        Some(Token::ParenGroup(body)) => body,
        Some(other) => bail!("invalid VALUES list: {}", other.text()),
        None => bail!("not enough arguments: missing VALUES list"),
    };
    i += 1;
    ensure!(i == args.len(), "unexpected trailing input after INSERT");

    let values = split_group_items(body)
        .iter()
        .map(|item| unquote(item))
        .collect::<Result<Vec<_>>>()?;

    if let Some(columns) = &columns {
        ensure!(
            columns.len() == values.len(),
            "mismatched number of values: {} values for {} columns",
            values.len(),
            columns.len()
        );
    }

    Ok(Statement::Insert(InsertArgs {
        table,
        columns,
        values,
    }))
}

fn capture_select(args: &[Token]) -> Result<Statement> {
    let mut fields = Vec::new();
    let mut all_fields = false;
    let mut i = 0;

    loop {
        let token = args
            .get(i)
            .ok_or_else(|| eyre!("not enough arguments: missing FROM clause"))?;
        if token.is_keyword(Keyword::From) {
            i += 1;
            break;
        }
        match token {
            Token::SymbolGroup(s) if s == "*" => all_fields = true,
            Token::Value(name) => fields.push(name.clone()),
            other => bail!("unexpected token in select list: {}", other.text()),
        }
        i += 1;
    }
    ensure!(
        all_fields || !fields.is_empty(),
        "not enough arguments: empty select list"
    );
    if all_fields {
        fields.clear();
    }

    let table = expect_value(args, i, "table name")?;
    i += 1;

    let mut joins = Vec::new();
    while args.get(i).is_some_and(is_join_start) {
        let (join, consumed) = capture_join(&args[i..], &table)?;
        joins.push(join);
        i += consumed;
    }

    let mut filter = None;
    if args.get(i).is_some_and(|t| t.is_keyword(Keyword::Where)) {
        filter = Some(parse_where_clause(&args[i + 1..], &table)?);
        i += 4;
    }
    ensure!(i == args.len(), "unexpected trailing input after SELECT");

    Ok(Statement::Select(SelectArgs {
        table,
        fields,
        all_fields,
        joins,
        filter,
    }))
}

fn is_join_start(token: &Token) -> bool {
    matches!(
        token.keyword(),
        Some(Keyword::Join)
            | Some(Keyword::Inner)
            | Some(Keyword::Left)
            | Some(Keyword::Right)
            | Some(Keyword::Outer)
    )
}

/// Captures one `[loc] JOIN child ON a.x = b.y [WHERE ...]` clause.
/// Returns the clause and the number of tokens consumed.
fn capture_join(args: &[Token], parent: &str) -> Result<(JoinClause, usize)> {
    let mut i = 0;

    let location = match args[0].keyword() {
        Some(Keyword::Inner) => {
            i += 1;
            JoinLocation::Inner
        }
        Some(Keyword::Left) => {
            i += 1;
            JoinLocation::Left
        }
        Some(Keyword::Right) => {
            i += 1;
            JoinLocation::Right
        }
        Some(Keyword::Outer) => {
            i += 1;
            JoinLocation::Outer
        }
        _ => JoinLocation::Inner,
    };

    ensure!(
        args.get(i).is_some_and(|t| t.is_keyword(Keyword::Join)),
        "join modifier must be followed by JOIN"
    );
    i += 1;

    let child = expect_value(args, i, "join table name")?;
    i += 1;

    ensure!(
        args.get(i).is_some_and(|t| t.is_keyword(Keyword::On)),
        "JOIN requires an ON condition"
    );
    i += 1;

    let (lhs, op, rhs) = parse_equation(&args[i..])?;
    i += 3;
    ensure!(op == Operator::Eq, "join operator must be =");
    ensure!(
        matches!(rhs, Token::Value(_)),
        "join condition operand must be a column reference"
    );

    let (left_table, left_field) = split_qualified(lhs.text())?;
    let (right_table, right_field) = split_qualified(rhs.text())?;

    let (parent_field, child_field) = if left_table == parent && right_table == child {
        (left_field, right_field)
    } else if left_table == child && right_table == parent {
        (right_field, left_field)
    } else {
        bail!(
            "join condition must reference {} and {}, got {} and {}",
            parent,
            child,
            left_table,
            right_table
        );
    };

    let mut filter = None;
    if args.get(i).is_some_and(|t| t.is_keyword(Keyword::Where)) {
        filter = Some(parse_where_clause(&args[i + 1..], &child)?);
        i += 4;
    }

    Ok((
        JoinClause {
            location,
            child,
            parent_field,
            child_field,
            filter,
        },
        i,
    ))
}

fn capture_delete(args: &[Token]) -> Result<Statement> {
    let table = expect_value(args, 0, "table name")?;
    let mut i = 1;

    let mut filter = None;
    if args.get(i).is_some_and(|t| t.is_keyword(Keyword::Where)) {
        filter = Some(parse_where_clause(&args[i + 1..], &table)?);
        i += 4;
    }
    ensure!(i == args.len(), "unexpected trailing input after DELETE");

    Ok(Statement::Delete(DeleteArgs { table, filter }))
}

fn capture_update(args: &[Token]) -> Result<Statement> {
    let table = expect_value(args, 0, "table name")?;
    ensure!(
        args.get(1).is_some_and(|t| t.is_keyword(Keyword::Set)),
        "UPDATE requires a SET clause"
    );

    let mut assignments = Vec::new();
    let mut seen = HashSet::new();
    let mut i = 2;
    while i < args.len() && !args[i].is_keyword(Keyword::Where) {
        let (lhs, op, rhs) = parse_equation(&args[i..])?;
        i += 3;
        ensure!(op == Operator::Eq, "SET assignments require =");

        let field = strip_qualifier(lhs.text(), &table)?;
        ensure!(
            seen.insert(field.clone()),
            "cannot SET the same column twice: {}",
            field
        );
        assignments.push(Assignment {
            field,
            value: rhs.text().to_string(),
        });
    }
    ensure!(
        !assignments.is_empty(),
        "not enough arguments: SET requires at least one assignment"
    );

    let mut filter = None;
    if args.get(i).is_some_and(|t| t.is_keyword(Keyword::Where)) {
        filter = Some(parse_where_clause(&args[i + 1..], &table)?);
        i += 4;
    }
    ensure!(i == args.len(), "unexpected trailing input after UPDATE");

    Ok(Statement::Update(UpdateArgs {
        table,
        assignments,
        filter,
    }))
}

/// Validates a three-token `operand OP operand` shape. The first operand
/// must be a bare value; the second a known operator; the third a bare
/// value or quote group.
fn parse_equation(tokens: &[Token]) -> Result<(&Token, Operator, &Token)> {
    ensure!(tokens.len() >= 3, "not enough arguments for comparison");

    let lhs = &tokens[0];
    ensure!(
        matches!(lhs, Token::Value(_)),
        "invalid first operand in comparison: {}",
        lhs.text()
    );

    let op = match &tokens[1] {
        Token::SymbolGroup(s) => {
            Operator::parse(s).ok_or_else(|| eyre!("{} is not a valid operator", s))?
        }
        other => bail!("{} is not a valid operator", other.text()),
    };

    let rhs = &tokens[2];
    ensure!(
        matches!(rhs, Token::Value(_) | Token::QuoteGroup(_)),
        "invalid value in comparison: {}",
        rhs.text()
    );

    Ok((lhs, op, rhs))
}

/// Parses the three tokens after WHERE. A `table.field` qualifier is
/// stripped when it names the statement's table and rejected otherwise.
fn parse_where_clause(tokens: &[Token], table: &str) -> Result<WhereClause> {
    let (lhs, op, rhs) = parse_equation(tokens)?;
    let field = strip_qualifier(lhs.text(), table)?;

    Ok(WhereClause {
        field,
        op,
        value: rhs.text().to_string(),
    })
}

fn strip_qualifier(field: &str, table: &str) -> Result<String> {
    let parts: Vec<&str> = field.split('.').collect();
    if parts.len() == 2 {
        ensure!(
            parts[0] == table,
            "field {} does not belong to table {}",
            field,
            table
        );
        return Ok(parts[1].to_string());
    }
    Ok(field.to_string())
}

/// Splits a `table.field` reference, requiring the qualifier.
fn split_qualified(operand: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = operand.split('.').collect();
    ensure!(
        parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty(),
        "join operand {} must be qualified as table.field",
        operand
    );
    Ok((parts[0].to_string(), parts[1].to_string()))
}

fn expect_value(args: &[Token], i: usize, what: &str) -> Result<String> {
    match args.get(i) {
        Some(Token::Value(s)) => Ok(s.clone()),
        Some(other) => bail!("invalid {}: {}", what, other.text()),
        None => bail!("not enough arguments: missing {}", what),
    }
}

/// Splits a parenthesis-group body on top-level commas. Commas inside
/// quoted text do not split; items are trimmed.
fn split_group_items(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in body.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                current.push(c);
            }
            ',' => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);

    items.iter().map(|s| s.trim().to_string()).collect()
}

/// Unwraps a quoted literal from a group body, applying `\` escapes.
/// Unquoted items pass through unchanged.
fn unquote(item: &str) -> Result<String> {
    let mut chars = item.chars();
    let Some(first) = chars.next() else {
        return Ok(String::new());
    };
    if first != '\'' && first != '"' {
        return Ok(item.to_string());
    }

    let mut out = String::new();
    let mut escaped = false;
    let mut closed = false;
    for c in chars {
        ensure!(!closed, "unexpected text after closing quote in {}", item);
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == first {
            closed = true;
        } else {
            out.push(c);
        }
    }
    ensure!(closed, "unclosed quote in {}", item);

    Ok(out)
}
