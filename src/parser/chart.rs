use crate::chart::ChartKind;
use crate::parser::ast::ChartSpec;
use crate::parser::lexer::{bool_literal, identifier, key, string_literal, ws};
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{map, map_opt},
    error::{Error, ErrorKind},
    multi::separated_list1,
    sequence::preceded,
    IResult,
};

#[derive(Debug)]
enum ChartArg {
    Group(String),
    Value(String),
    By(String),
    Label(String),
    Stacked(bool),
}

fn chart_kind(input: &str) -> IResult<&str, ChartKind> {
    map_opt(identifier, |name| match name.as_str() {
        "bar" => Some(ChartKind::Bar),
        "horizontal_bar" => Some(ChartKind::HorizontalBar),
        "doughnut" => Some(ChartKind::Doughnut),
        "pie" => Some(ChartKind::Pie),
        _ => None,
    })(input)
}

fn chart_arg(input: &str) -> IResult<&str, ChartArg> {
    alt((
        map(preceded(key("group"), ws(identifier)), ChartArg::Group),
        map(preceded(key("value"), ws(identifier)), ChartArg::Value),
        map(preceded(key("by"), ws(identifier)), ChartArg::By),
        map(preceded(key("label"), ws(string_literal)), ChartArg::Label),
        map(preceded(key("stacked"), ws(bool_literal)), ChartArg::Stacked),
    ))(input)
}

/// `bar(group: Status, value: CaseCount)` and friends
pub fn parse_chart(input: &str) -> IResult<&str, ChartSpec> {
    let start = input;
    let (input, kind) = ws(chart_kind)(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, args) = separated_list1(ws(char(',')), chart_arg)(input)?;
    let (input, _) = ws(char(')'))(input)?;

    let mut group = None;
    let mut value = None;
    let mut by = None;
    let mut label = None;
    let mut stacked = None;
    for arg in args {
        match arg {
            ChartArg::Group(g) => group = Some(g),
            ChartArg::Value(v) => value = Some(v),
            ChartArg::By(b) => by = Some(b),
            ChartArg::Label(l) => label = Some(l),
            ChartArg::Stacked(s) => stacked = Some(s),
        }
    }

    let (Some(group), Some(value)) = (group, value) else {
        // group and value are mandatory
        return Err(nom::Err::Failure(Error::new(start, ErrorKind::Verify)));
    };

    Ok((
        input,
        ChartSpec {
            kind,
            group,
            value,
            by,
            label,
            stacked,
        },
    ))
}
