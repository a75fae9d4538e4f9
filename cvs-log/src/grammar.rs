//! Small `nom` combinators for the fixed-format lines within a single
//! delta's header (`revision ...` / `date: ...; author: ...; state: ...;`).
//! The surrounding per-file structure (header block, delta delimiters) is
//! plain line-oriented scanning in `parser.rs`: there's no ambiguity to
//! resolve there, so a grammar would only add ceremony.

use nom::{
    bytes::complete::{tag, take_till, take_while1},
    character::complete::{char, space0},
    combinator::rest,
    sequence::{delimited, preceded, terminated},
    IResult,
};

pub(crate) fn revision_line(input: &str) -> IResult<&str, &str> {
    preceded(tag("revision "), take_while1(|c: char| !c.is_whitespace()))(input)
}

/// Parses `date: <date>;  author: <author>;  state: <state>;` and discards
/// anything after the final semicolon (`lines: +a -b;`, `commitid: ...;`),
/// which `cvs log` appends but this tool has no use for.
pub(crate) fn date_author_state(input: &str) -> IResult<&str, (&str, &str, &str)> {
    let (input, date) = field(input, "date")?;
    let (input, author) = field(input, "author")?;
    let (input, state) = field(input, "state")?;
    Ok((input, (date, author, state)))
}

pub(crate) fn branches_line(input: &str) -> IResult<&str, Vec<&str>> {
    let (input, _) = delimited(space0, tag("branches:"), space0)(input)?;
    let (input, remainder) = rest(input)?;

    Ok((
        input,
        remainder
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect(),
    ))
}

fn field<'a>(input: &'a str, name: &str) -> IResult<&'a str, &'a str> {
    let (input, _) = delimited(space0, tag(name), char(':'))(input)?;
    let (input, _) = space0(input)?;
    terminated(take_till(|c| c == ';'), char(';'))(input)
}

pub(crate) fn symbol_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = space0(input)?;
    let (input, name) = take_till(|c| c == ':')(input)?;
    let (input, _) = char(':')(input)?;
    let (input, _) = space0(input)?;
    let (input, revision) = rest(input)?;
    Ok((input, (name.trim(), revision.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_line() {
        assert_eq!(revision_line("revision 1.4.2.1").unwrap().1, "1.4.2.1");
    }

    #[test]
    fn test_date_author_state() {
        let (_, (date, author, state)) = date_author_state(
            "date: 2021/08/20 17:34:26;  author: adam;  state: Exp;  lines: +1 -1;",
        )
        .unwrap();
        assert_eq!(date, "2021/08/20 17:34:26");
        assert_eq!(author, "adam");
        assert_eq!(state, "Exp");
    }

    #[test]
    fn test_date_author_state_dead() {
        let (_, (_, _, state)) =
            date_author_state("date: 2021-08-20 17:34:26 +0000;  author: adam;  state: dead;")
                .unwrap();
        assert_eq!(state, "dead");
    }

    #[test]
    fn test_branches_line() {
        let (_, branches) = branches_line("branches:  1.2.2.1; 1.2.4.1;").unwrap();
        assert_eq!(branches, vec!["1.2.2.1", "1.2.4.1"]);
    }

    #[test]
    fn test_symbol_line() {
        assert_eq!(symbol_line("REL1_0: 1.2").unwrap().1, ("REL1_0", "1.2"));
    }
}
