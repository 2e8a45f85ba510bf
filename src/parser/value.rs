use crate::{
    ast::InputValue,
    parser::{ParseError, ParseResult, Parser, Spanning, Token},
};

pub fn parse_value_literal<'a>(
    parser: &mut Parser<'a>,
    is_const: bool,
) -> ParseResult<InputValue> {
    match parser.peek() {
        Spanning {
            item: Token::BracketOpen,
            ..
        } => parse_list_literal(parser, is_const),
        Spanning {
            item: Token::CurlyOpen,
            ..
        } => parse_object_literal(parser, is_const),
        Spanning {
            item: Token::Dollar,
            ..
        } if !is_const => parse_variable_literal(parser),
        Spanning {
            item: Token::Int(i),
            ..
        } => {
            let i = *i;
            Ok(parser.next_token()?.map(|_| InputValue::int(i)))
        }
        Spanning {
            item: Token::Float(f),
            ..
        } => {
            let f = *f;
            Ok(parser.next_token()?.map(|_| InputValue::float(f)))
        }
        Spanning {
            item: Token::String(_),
            ..
        } => Ok(parser.next_token()?.map(|t| {
            if let Token::String(s) = t {
                InputValue::String(s)
            } else {
                panic!("internal parser error");
            }
        })),
        Spanning {
            item: Token::RawString(_),
            ..
        } => Ok(parser.next_token()?.map(|t| {
            if let Token::RawString(s) = t {
                InputValue::string(s)
            } else {
                panic!("internal parser error");
            }
        })),
        Spanning {
            item: Token::Name("true"),
            ..
        } => Ok(parser.next_token()?.map(|_| InputValue::boolean(true))),
        Spanning {
            item: Token::Name("false"),
            ..
        } => Ok(parser.next_token()?.map(|_| InputValue::boolean(false))),
        Spanning {
            item: Token::Name("null"),
            ..
        } => Ok(parser.next_token()?.map(|_| InputValue::null())),
        Spanning {
            item: Token::Name(name),
            ..
        } => {
            let name = *name;
            Ok(parser
                .next_token()?
                .map(|_| InputValue::enum_value(name)))
        }
        _ => Err(parser.next_token()?.map(ParseError::unexpected_token)),
    }
}

fn parse_list_literal<'a>(parser: &mut Parser<'a>, is_const: bool) -> ParseResult<InputValue> {
    Ok(parser
        .delimited_list(
            &Token::BracketOpen,
            |p| parse_value_literal(p, is_const),
            &Token::BracketClose,
        )?
        .map(InputValue::parsed_list))
}

fn parse_object_literal<'a>(
    parser: &mut Parser<'a>,
    is_const: bool,
) -> ParseResult<InputValue> {
    Ok(parser
        .delimited_list(
            &Token::CurlyOpen,
            |p| parse_object_field(p, is_const),
            &Token::CurlyClose,
        )?
        .map(|items| InputValue::parsed_object(items.into_iter().map(|s| s.item).collect())))
}

fn parse_object_field<'a>(
    parser: &mut Parser<'a>,
    is_const: bool,
) -> ParseResult<(Spanning<String>, Spanning<InputValue>)> {
    let key = parser.expect_name()?;

    parser.expect(&Token::Colon)?;

    let value = parse_value_literal(parser, is_const)?;

    Ok(Spanning::start_end(
        &key.span.start,
        &value.span.end.clone(),
        (key.map(|s| s.into()), value),
    ))
}

fn parse_variable_literal<'a>(parser: &mut Parser<'a>) -> ParseResult<InputValue> {
    let Spanning {
        span: start_span, ..
    } = parser.expect(&Token::Dollar)?;
    let Spanning {
        item: name,
        span: end_span,
    } = parser.expect_name()?;

    Ok(Spanning::start_end(
        &start_span.start,
        &end_span.end,
        InputValue::variable(name),
    ))
}
