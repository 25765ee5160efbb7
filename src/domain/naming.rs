// Name sequencing for widget titles and dashboard names
//
// A sequence is "X", "X<sep>2", "X<sep>3", ... where the unsuffixed name counts as 1.
use std::cmp::Ordering;

const WIDGET_FALLBACK: &str = " 2";
const DASHBOARD_FALLBACK: &str = "-2";

/// Next widget title: "Disk Reads" -> "Disk Reads 2", "Disk Reads 2" -> "Disk Reads 3"
pub fn next_widget_title(title: &str) -> String {
    next_in_sequence(title, WIDGET_FALLBACK)
}

/// Next dashboard name: "db-prefix" -> "db-prefix-2", "db-prefix-2" -> "db-prefix-3"
pub fn next_dashboard_name(name: &str) -> String {
    next_in_sequence(name, DASHBOARD_FALLBACK)
}

fn next_in_sequence(name: &str, fallback: &str) -> String {
    let (stem, digits) = split_suffix(name);
    if digits.is_empty() {
        format!("{}{}", name, fallback)
    } else {
        format!("{}{}", stem, increment_decimal(digits))
    }
}

/// Position of a name in its sequence. Names without a trailing number are 1.
pub fn sequence_number(name: &str) -> u64 {
    let (_, digits) = split_suffix(name);
    if digits.is_empty() {
        return 1;
    }
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return 0;
    }
    significant.parse().unwrap_or(u64::MAX)
}

/// Orders names so that the highest member of a sequence sorts last,
/// including multi-digit suffixes ("X 2" < "X 10").
pub fn sequence_order(a: &str, b: &str) -> Ordering {
    let (stem_a, digits_a) = split_suffix(a);
    let (stem_b, digits_b) = split_suffix(b);
    let stem_a = stem_a.trim_end_matches([' ', '-']);
    let stem_b = stem_b.trim_end_matches([' ', '-']);

    stem_a
        .cmp(stem_b)
        .then_with(|| compare_suffix(digits_a, digits_b))
        .then_with(|| a.cmp(b))
}

fn compare_suffix(a: &str, b: &str) -> Ordering {
    let a = significant_digits(a);
    let b = significant_digits(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

// "" (no suffix) behaves as "1"
fn significant_digits(digits: &str) -> &str {
    if digits.is_empty() {
        return "1";
    }
    digits.trim_start_matches('0')
}

fn split_suffix(name: &str) -> (&str, &str) {
    let stem_len = name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    name.split_at(stem_len)
}

/// Adds one to a run of decimal digits without going through a fixed-width integer
fn increment_decimal(digits: &str) -> String {
    let mut bytes: Vec<u8> = digits.trim_start_matches('0').bytes().collect();
    let mut i = bytes.len();
    loop {
        if i == 0 {
            bytes.insert(0, b'1');
            break;
        }
        i -= 1;
        if bytes[i] == b'9' {
            bytes[i] = b'0';
        } else {
            bytes[i] += 1;
            break;
        }
    }
    bytes.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_widget_title() {
        assert_eq!(next_widget_title("Disk Reads"), "Disk Reads 2");
        assert_eq!(next_widget_title("Disk Reads 2"), "Disk Reads 3");
        assert_eq!(next_widget_title("VolumeReadBytes 9"), "VolumeReadBytes 10");
        assert_eq!(next_widget_title("VolumeReadBytes 19"), "VolumeReadBytes 20");
    }

    #[test]
    fn test_next_dashboard_name() {
        assert_eq!(next_dashboard_name("db-prefix"), "db-prefix-2");
        assert_eq!(next_dashboard_name("db-prefix-2"), "db-prefix-3");
        assert_eq!(next_dashboard_name("ebs 999"), "ebs 1000");
    }

    #[test]
    fn test_leading_zeros_dropped() {
        assert_eq!(next_widget_title("Chart 007"), "Chart 8");
        assert_eq!(next_widget_title("Chart 000"), "Chart 1");
    }

    #[test]
    fn test_total_for_odd_input() {
        assert_eq!(next_widget_title(""), " 2");
        assert_eq!(next_dashboard_name("42"), "43");
        assert_eq!(
            next_widget_title("w 99999999999999999999999"),
            "w 100000000000000000000000"
        );
    }

    #[test]
    fn test_sequence_number() {
        assert_eq!(sequence_number("VolumeReadOps"), 1);
        assert_eq!(sequence_number("VolumeReadOps 12"), 12);
        assert_eq!(sequence_number("ebs-1001"), 1001);
        assert_eq!(sequence_number("w 99999999999999999999999"), u64::MAX);
    }

    #[test]
    fn test_sequence_order_puts_highest_last() {
        let mut titles = vec![
            "VolumeReadBytes 10",
            "VolumeReadBytes 2",
            "VolumeReadBytes",
            "VolumeReadBytes 9",
        ];
        titles.sort_by(|a, b| sequence_order(a, b));
        assert_eq!(
            titles,
            vec![
                "VolumeReadBytes",
                "VolumeReadBytes 2",
                "VolumeReadBytes 9",
                "VolumeReadBytes 10"
            ]
        );

        let mut names = vec!["ebs-3", "ebs", "ebs-2"];
        names.sort_by(|a, b| sequence_order(a, b));
        assert_eq!(names, vec!["ebs", "ebs-2", "ebs-3"]);
    }
}
