use super::domain::CurrencyCode;

/// Whole-number price with `.` as thousands separator, e.g. `1.250.000`. Fractions are cut off.
pub fn format_price(value: f64) -> String {
    let whole = value.trunc() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    if whole < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Price label as shown on listing cards: `€ 1.000`, `$ 1.000`, otherwise `SRD 1.000`.
pub fn format_currency(value: f64, currency: &CurrencyCode) -> String {
    let amount = format_price(value);
    match currency.as_str() {
        "EUR" => format!("€ {amount}"),
        "USD" => format!("$ {amount}"),
        code => format!("{code} {amount}"),
    }
}
