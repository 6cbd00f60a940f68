use std::str::FromStr;

use rust_decimal::Decimal;

/// Parse a supplier price string such as `"£0.052"`, `"$1,234.50"` or
/// `"0,05 €"` into a decimal.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if kept.is_empty() {
        return None;
    }

    // A lone comma is a decimal separator; otherwise commas group thousands.
    let normalized = if kept.contains(',') && !kept.contains('.') && kept.matches(',').count() == 1
    {
        let (whole, frac) = kept.split_once(',')?;
        if frac.len() == 3 && !whole.is_empty() {
            kept.replace(',', "")
        } else {
            kept.replace(',', ".")
        }
    } else if kept.contains(',') && kept.contains('.') && kept.rfind(',') > kept.rfind('.') {
        kept.replace('.', "").replace(',', ".")
    } else {
        kept.replace(',', "")
    };

    Decimal::from_str(&normalized).ok()
}

/// Leading stock count of an availability string such as `"1,234 In Stock"`.
pub fn parse_stock(text: &str) -> Option<u64> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Decimal from a JSON number without going through a binary float.
pub fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        serde_json::Value::String(s) => parse_price(s),
        _ => None,
    }
}
