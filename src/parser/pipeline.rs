// Request parser: chart component and optional labels, separated by `|`

use super::ast::{ChartSpec, Labels, RequestSpec};
use super::chart::parse_chart;
use super::labels::parse_labs;
use super::lexer::ws;
use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{eof, map, opt},
    error::{Error, ErrorKind},
    multi::separated_list1,
    IResult,
};

#[derive(Debug)]
enum RequestComponent {
    Chart(ChartSpec),
    Labels(Labels),
}

fn parse_request_component(input: &str) -> IResult<&str, RequestComponent> {
    alt((
        map(parse_chart, RequestComponent::Chart),
        map(parse_labs, RequestComponent::Labels),
    ))(input)
}

/// Parse a complete chart request.
/// Format: component | component ...
pub fn parse_request(input: &str) -> IResult<&str, RequestSpec> {
    let start = input;

    // If input starts with "|", consume it
    let (input, _) = opt(ws(tag("|")))(input)?;

    let (input, components) = separated_list1(ws(tag("|")), parse_request_component)(input)?;

    let (input, _) = ws(eof)(input)?;

    let mut chart = None;
    let mut labels: Option<Labels> = None;
    for comp in components {
        match comp {
            RequestComponent::Chart(c) => {
                if chart.is_some() {
                    // one chart per request
                    return Err(nom::Err::Failure(Error::new(start, ErrorKind::Verify)));
                }
                chart = Some(c);
            }
            RequestComponent::Labels(l) => {
                let merged = labels.get_or_insert_with(Labels::default);
                if l.title.is_some() {
                    merged.title = l.title;
                }
            }
        }
    }

    let Some(chart) = chart else {
        return Err(nom::Err::Failure(Error::new(start, ErrorKind::Verify)));
    };

    Ok((input, RequestSpec { chart, labels }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;

    #[test]
    fn test_parse_chart_only() {
        let result = parse_request("doughnut(group: Status, value: CaseCount)");
        assert!(result.is_ok());
        let (_, spec) = result.unwrap();
        assert_eq!(spec.chart.kind, ChartKind::Doughnut);
        assert!(spec.labels.is_none());
        assert_eq!(spec.title(), None);
    }

    #[test]
    fn test_parse_with_labels() {
        let (_, spec) = parse_request(
            r#"horizontal_bar(group: CaseOwner, value: CaseCount, by: Status) | labs(title: "By Owner")"#,
        )
        .unwrap();
        assert!(spec.chart.is_stacked());
        assert_eq!(spec.title(), Some("By Owner"));
    }

    #[test]
    fn test_labels_first_and_leading_pipe() {
        let (_, spec) =
            parse_request(r#" | labs(title: "T") | bar(group: A, value: B) "#).unwrap();
        assert_eq!(spec.chart.group, "A");
        assert_eq!(spec.title(), Some("T"));
    }

    #[test]
    fn test_later_labels_override() {
        let (_, spec) = parse_request(
            r#"bar(group: A, value: B) | labs(title: "one") | labs() | labs(title: "two")"#,
        )
        .unwrap();
        assert_eq!(spec.title(), Some("two"));
    }

    #[test]
    fn test_two_charts_rejected() {
        assert!(parse_request("bar(group: A, value: B) | pie(group: A, value: B)").is_err());
    }

    #[test]
    fn test_labels_alone_rejected() {
        assert!(parse_request(r#"labs(title: "T")"#).is_err());
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse_request("bar(group: A, value: B) extra").is_err());
        assert!(parse_request("").is_err());
    }
}
