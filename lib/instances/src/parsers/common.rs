use super::nom_prelude::*;

pub fn usize_<'a, E>(input: &'a str) -> IResult<&'a str, usize, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_res(digit1, usize::from_str)(input)
}

pub fn isize_<'a, E>(input: &'a str) -> IResult<&'a str, isize, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_res(
    recognize(
      pair(
        opt(alt((char('-'), char('+')))),
        digit1
      )
    ), isize::from_str)(input)
}

/// Trailing blanks followed by a line break, or the end of input.
pub fn line_end<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
  where
    E: ParseError<&'a str>
{
  preceded(space0, alt((line_ending, eof)))(input)
}

/// A value preceded by at least one blank.
pub fn spaced<'a, O, E, F>(f: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
  where
    E: ParseError<&'a str>,
    F: Parser<&'a str, O, E>,
{
  preceded(space1, f)
}

#[cfg(test)]
mod tests {
  use super::*;
  type E<'a> = error::VerboseError<&'a str>;

  #[test]
  fn signed_integers() {
    assert_eq!(isize_::<E>("-3 rest"), Ok((" rest", -3)));
    assert_eq!(isize_::<E>("+2"), Ok(("", 2)));
    assert_eq!(usize_::<E>("17\n"), Ok(("\n", 17)));
  }

  #[test]
  fn line_endings() {
    assert_eq!(line_end::<E>("   \r\nnext"), Ok(("next", "\r\n")));
    assert_eq!(line_end::<E>("  "), Ok(("", "")));
    assert!(line_end::<E>(" x").is_err());
  }
}
