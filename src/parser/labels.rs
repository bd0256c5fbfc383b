use crate::parser::ast::Labels;
use crate::parser::lexer::{key, string_literal, ws};
use nom::{
    bytes::complete::tag, character::complete::char, multi::separated_list0, sequence::preceded,
    IResult,
};

pub fn parse_labs(input: &str) -> IResult<&str, Labels> {
    let (input, _) = ws(tag("labs"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, titles) = separated_list0(
        ws(char(',')),
        preceded(key("title"), ws(string_literal)),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    // later titles override earlier ones
    Ok((input, Labels { title: titles.into_iter().last() }))
}
