use std::fmt;
use std::str::FromStr;

/// Why a watch expression was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseWatchError {
    #[error("Invalid expression! Expected <addr> <op> <value>")]
    Malformed,
    #[error("Invalid equality sign '{0}'!")]
    UnknownOperator(String),
    #[error("Invalid expression! '{0}' is not an integer")]
    NotAnInteger(String),
}

/// Comparison applied to a watched cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
}

impl Comparison {
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Comparison::Equal => lhs == rhs,
            Comparison::NotEqual => lhs != rhs,
            Comparison::Greater => lhs > rhs,
            Comparison::Less => lhs < rhs,
            Comparison::GreaterEqual => lhs >= rhs,
            Comparison::LessEqual => lhs <= rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Equal => "=",
            Comparison::NotEqual => "!=",
            Comparison::Greater => ">",
            Comparison::Less => "<",
            Comparison::GreaterEqual => ">=",
            Comparison::LessEqual => "<=",
        }
    }
}

impl FromStr for Comparison {
    type Err = ParseWatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "=" | "==" => Comparison::Equal,
            "!=" => Comparison::NotEqual,
            ">" => Comparison::Greater,
            "<" => Comparison::Less,
            ">=" => Comparison::GreaterEqual,
            "<=" => Comparison::LessEqual,
            other => return Err(ParseWatchError::UnknownOperator(other.to_string())),
        })
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Predicate checked against one memory cell after every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub comparison: Comparison,
    pub operand: i64,
}

impl Condition {
    pub fn matches(&self, value: i64) -> bool {
        self.comparison.holds(value, self.operand)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.comparison, self.operand)
    }
}

/// Parse the arguments of `watch`: either `<addr> <op> <value>` as three
/// tokens or a single compact token such as `-1>5`.
pub fn parse_watch(args: &[&str]) -> Result<(isize, Condition), ParseWatchError> {
    let (addr, op, value) = match args {
        [addr, op, value] => (*addr, *op, *value),
        [compact] => split_compact(compact)?,
        _ => return Err(ParseWatchError::Malformed),
    };

    let address = addr
        .parse::<isize>()
        .map_err(|_| ParseWatchError::NotAnInteger(addr.to_string()))?;
    let comparison = op.parse::<Comparison>()?;
    let operand = value
        .parse::<i64>()
        .map_err(|_| ParseWatchError::NotAnInteger(value.to_string()))?;

    Ok((address, Condition { comparison, operand }))
}

fn split_compact(expr: &str) -> Result<(&str, &str, &str), ParseWatchError> {
    let is_op = |c: char| matches!(c, '=' | '!' | '<' | '>');
    // Skip the first char so a leading '-' stays part of the address.
    let start = expr
        .char_indices()
        .skip(1)
        .find(|&(_, c)| is_op(c))
        .map(|(i, _)| i)
        .ok_or(ParseWatchError::Malformed)?;
    let end = expr[start..]
        .find(|c: char| !is_op(c))
        .map(|i| start + i)
        .ok_or(ParseWatchError::Malformed)?;
    Ok((&expr[..start], &expr[start..end], &expr[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_token_form() {
        let (addr, cond) = parse_watch(&["-1", ">", "5"]).unwrap();
        assert_eq!(addr, -1);
        assert_eq!(cond, Condition { comparison: Comparison::Greater, operand: 5 });
    }

    #[test]
    fn compact_form_with_negative_address() {
        let (addr, cond) = parse_watch(&["-1>=5"]).unwrap();
        assert_eq!(addr, -1);
        assert_eq!(cond.comparison, Comparison::GreaterEqual);
        assert_eq!(cond.operand, 5);

        let (addr, cond) = parse_watch(&["3!=-2"]).unwrap();
        assert_eq!(addr, 3);
        assert_eq!(cond.comparison, Comparison::NotEqual);
        assert_eq!(cond.operand, -2);
    }

    #[test]
    fn rejects_unknown_operator() {
        assert_eq!(
            parse_watch(&["1", "=>", "2"]),
            Err(ParseWatchError::UnknownOperator("=>".to_string()))
        );
    }

    #[test]
    fn rejects_non_integers_and_bad_arity() {
        assert!(matches!(parse_watch(&["x", "=", "2"]), Err(ParseWatchError::NotAnInteger(_))));
        assert!(matches!(parse_watch(&["1", "=", "two"]), Err(ParseWatchError::NotAnInteger(_))));
        assert_eq!(parse_watch(&["1", "="]), Err(ParseWatchError::Malformed));
        assert_eq!(parse_watch(&["15"]), Err(ParseWatchError::Malformed));
        assert_eq!(parse_watch(&["1>"]), Err(ParseWatchError::Malformed));
    }

    #[test]
    fn comparisons_hold() {
        assert!(Comparison::Equal.holds(2, 2));
        assert!(Comparison::NotEqual.holds(2, 3));
        assert!(Comparison::Greater.holds(6, 5));
        assert!(!Comparison::Greater.holds(5, 5));
        assert!(Comparison::Less.holds(-1, 0));
        assert!(Comparison::GreaterEqual.holds(5, 5));
        assert!(Comparison::LessEqual.holds(4, 5));
    }
}
