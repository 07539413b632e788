use storescout_common::ParseError;

/// Strip every non-digit character, then parse. Directory pages decorate
/// counts with grouping whitespace and entities like `&nbsp;`.
pub fn parse_count(field: &'static str, raw: &str) -> Result<u64, ParseError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ParseError::Number {
            field,
            value: raw.to_string(),
        });
    }
    digits.parse().map_err(|_| ParseError::Number {
        field,
        value: raw.to_string(),
    })
}

/// Parse a decimal that may use a comma separator (`4,7` parses as 4.7).
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<f64, ParseError> {
    raw.trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| ParseError::Number {
            field,
            value: raw.to_string(),
        })
}
