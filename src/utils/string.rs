/// String helpers for the console driver

use crate::types::RemovalAmount;

/// Format a quantity with thousands separators
pub fn format_quantity(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*ch);
    }

    result
}

/// Parse a removal amount: a positive number or `all`
pub fn parse_removal_amount(text: &str) -> Option<RemovalAmount> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("all") {
        return Some(RemovalAmount::All);
    }
    text.replace(',', "").parse().ok().map(RemovalAmount::Exactly)
}

/// Turn an item id like `oak_logs` into `Oak Logs`
pub fn display_name(id: &str) -> String {
    id.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(0), "0");
        assert_eq!(format_quantity(1000), "1,000");
        assert_eq!(format_quantity(1234567), "1,234,567");
        assert_eq!(format_quantity(123), "123");
    }

    #[test]
    fn test_parse_removal_amount() {
        assert_eq!(parse_removal_amount("all"), Some(RemovalAmount::All));
        assert_eq!(parse_removal_amount(" ALL "), Some(RemovalAmount::All));
        assert_eq!(parse_removal_amount("15"), Some(RemovalAmount::Exactly(15)));
        assert_eq!(parse_removal_amount("1,500"), Some(RemovalAmount::Exactly(1500)));
        assert_eq!(parse_removal_amount("-3"), None);
        assert_eq!(parse_removal_amount("lots"), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("oak_logs"), "Oak Logs");
        assert_eq!(display_name("IRON_ORE"), "Iron Ore");
        assert_eq!(display_name("empty_i_3"), "Empty I 3");
    }
}
