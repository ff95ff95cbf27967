/// Format an amount with two decimals, space-grouped thousands and a currency
/// suffix: `1 234.56 kr`.
pub fn money(val: f64, currency: &str) -> String {
    let negative = val < 0.0 && format!("{:.2}", val.abs()) != "0.00";
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    let sign = if negative { "-" } else { "" };
    if currency.is_empty() {
        format!("{sign}{grouped}.{dec_part}")
    } else {
        format!("{sign}{grouped}.{dec_part} {currency}")
    }
}

/// Share of `part` in `whole` as a percentage, 0 when `whole` is 0.
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}
