//! Amount in words on the Indian numbering scale (crore, lakh, thousand).
//!
//! The net-pay line reads `Rupees <words> Only`, so paise are dropped: the
//! amount is rounded half-to-even to a whole number first.

const ONES: [&str; 20] = [
    "Zero",
    "One",
    "Two",
    "Three",
    "Four",
    "Five",
    "Six",
    "Seven",
    "Eight",
    "Nine",
    "Ten",
    "Eleven",
    "Twelve",
    "Thirteen",
    "Fourteen",
    "Fifteen",
    "Sixteen",
    "Seventeen",
    "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const CRORE: u64 = 10_000_000;
const LAKH: u64 = 100_000;
const THOUSAND: u64 = 1_000;

/// Words for 1..=999. Empty for 0.
fn hundreds_to_words(number: u64) -> String {
    debug_assert!(number < 1000);
    let mut words: Vec<String> = Vec::with_capacity(3);
    let (hundreds, remainder) = (number / 100, number % 100);
    if hundreds > 0 {
        words.push(format!("{} Hundred", ONES[hundreds as usize]));
    }
    if remainder > 0 {
        if remainder < 20 {
            words.push(ONES[remainder as usize].to_string());
        } else {
            let (tens, ones) = (remainder / 10, remainder % 10);
            if ones == 0 {
                words.push(TENS[tens as usize].to_string());
            } else {
                words.push(format!("{} {}", TENS[tens as usize], ONES[ones as usize]));
            }
        }
    }
    words.join(" ")
}

/// Words for a whole number. Crore counts above 999 recurse, giving e.g.
/// `One Thousand Crore`.
pub fn integer_to_words(amount: u64) -> String {
    if amount == 0 {
        return ONES[0].to_string();
    }

    let crores = amount / CRORE;
    let rest = amount % CRORE;
    let (lakhs, rest) = (rest / LAKH, rest % LAKH);
    let (thousands, hundreds) = (rest / THOUSAND, rest % THOUSAND);

    let mut parts: Vec<String> = Vec::with_capacity(4);
    if crores > 0 {
        let crore_words = if crores < 1000 {
            hundreds_to_words(crores)
        } else {
            integer_to_words(crores)
        };
        parts.push(format!("{crore_words} Crore"));
    }
    if lakhs > 0 {
        parts.push(format!("{} Lakh", hundreds_to_words(lakhs)));
    }
    if thousands > 0 {
        parts.push(format!("{} Thousand", hundreds_to_words(thousands)));
    }
    if hundreds > 0 {
        parts.push(hundreds_to_words(hundreds));
    }
    parts.join(" ")
}

/// Words for a monetary amount. Negative amounts are prefixed with `Minus`.
pub fn number_to_words(amount: f64) -> String {
    let rounded = if amount.is_finite() {
        amount.round_ties_even()
    } else {
        0.0
    };
    let magnitude = rounded.abs().min(u64::MAX as f64) as u64;
    if rounded < 0.0 && magnitude > 0 {
        format!("Minus {}", integer_to_words(magnitude))
    } else {
        integer_to_words(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_words() {
        assert_eq!(number_to_words(0.0), "Zero");
        assert_eq!(number_to_words(1000.0), "One Thousand");
        assert_eq!(number_to_words(100000.0), "One Lakh");
        assert_eq!(number_to_words(10000000.0), "One Crore");
    }

    #[test]
    fn mixed_amounts() {
        assert_eq!(
            number_to_words(123456.0),
            "One Lakh Twenty Three Thousand Four Hundred Fifty Six"
        );
        assert_eq!(number_to_words(33200.0), "Thirty Three Thousand Two Hundred");
        assert_eq!(number_to_words(19.0), "Nineteen");
        assert_eq!(number_to_words(90.0), "Ninety");
        assert_eq!(number_to_words(101.0), "One Hundred One");
        assert_eq!(
            number_to_words(98765432.0),
            "Nine Crore Eighty Seven Lakh Sixty Five Thousand Four Hundred Thirty Two"
        );
    }

    #[test]
    fn paise_are_rounded_away() {
        assert_eq!(number_to_words(999.49), "Nine Hundred Ninety Nine");
        assert_eq!(number_to_words(999.5), "One Thousand");
        // Half-to-even: 2.5 rounds down to 2.
        assert_eq!(number_to_words(2.5), "Two");
        assert_eq!(number_to_words(0.4), "Zero");
    }

    #[test]
    fn large_crore_counts_recurse() {
        assert_eq!(number_to_words(10_000_000_000.0), "One Thousand Crore");
    }

    #[test]
    fn negative_and_non_finite() {
        assert_eq!(number_to_words(-1500.0), "Minus One Thousand Five Hundred");
        assert_eq!(number_to_words(-0.2), "Zero");
        assert_eq!(number_to_words(f64::NAN), "Zero");
    }
}
