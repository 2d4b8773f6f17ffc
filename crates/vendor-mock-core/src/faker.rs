//! Plausible-looking Indian business data for mock records.

use rand::Rng;

const COMPANY_STEMS: &[&str] = &[
    "Sharma", "Patel", "Iyer", "Reddy", "Kapoor", "Mehta", "Bose", "Nair", "Gupta", "Chopra",
    "Agarwal", "Desai", "Joshi", "Malhotra", "Banerjee", "Kulkarni",
];

const COMPANY_KINDS: &[&str] = &[
    "Traders",
    "Logistics",
    "Enterprises",
    "Industries",
    "Infotech",
    "Agro Foods",
    "Textiles",
    "Engineering Works",
    "Distributors",
    "Pharma",
    "Packaging",
    "Retail",
];

const COMPANY_SUFFIXES: &[&str] = &["Pvt Ltd", "Ltd", "LLP", "& Sons", "Group", "and Co"];

const FIRST_NAMES: &[&str] = &[
    "Aarav", "Vivaan", "Aditya", "Ananya", "Diya", "Ishaan", "Kavya", "Meera", "Rohan", "Saanvi",
    "Arjun", "Priya", "Rahul", "Neha", "Vikram", "Pooja",
];

const LAST_NAMES: &[&str] = &[
    "Sharma", "Verma", "Iyer", "Reddy", "Singh", "Kumar", "Das", "Menon", "Pillai", "Rao",
    "Chatterjee", "Shah", "Yadav", "Mishra",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.in", "mail.test", "vendors.test"];

const STREET_NAMES: &[&str] = &[
    "MG Road",
    "Station Road",
    "Park Street",
    "Residency Road",
    "Linking Road",
    "Anna Salai",
    "Brigade Road",
    "Ring Road",
    "Nehru Nagar",
    "Gandhi Marg",
];

const CITIES: &[&str] = &[
    "Mumbai",
    "Delhi",
    "Bengaluru",
    "Chennai",
    "Hyderabad",
    "Pune",
    "Kolkata",
    "Ahmedabad",
    "Jaipur",
    "Lucknow",
    "Kochi",
    "Indore",
];

const STATES: &[&str] = &[
    "Maharashtra",
    "Delhi",
    "Karnataka",
    "Tamil Nadu",
    "Telangana",
    "West Bengal",
    "Gujarat",
    "Rajasthan",
    "Uttar Pradesh",
    "Kerala",
    "Madhya Pradesh",
];

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

/// Expands `?` to an uppercase ASCII letter and `#` to a digit; any other
/// character is copied through.
pub fn bothify<R: Rng>(rng: &mut R, pattern: &str) -> String {
    pattern
        .chars()
        .map(|ch| match ch {
            '?' => char::from(b'A' + rng.gen_range(0..26_u8)),
            '#' => char::from(b'0' + rng.gen_range(0..10_u8)),
            other => other,
        })
        .collect()
}

pub fn company<R: Rng>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, COMPANY_STEMS), pick(rng, COMPANY_KINDS))
}

pub fn company_suffix<R: Rng>(rng: &mut R) -> String {
    pick(rng, COMPANY_SUFFIXES).to_string()
}

pub fn name<R: Rng>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES))
}

pub fn email<R: Rng>(rng: &mut R) -> String {
    let first = pick(rng, FIRST_NAMES).to_ascii_lowercase();
    let last = pick(rng, LAST_NAMES).to_ascii_lowercase();
    format!("{first}.{last}{}@{}", rng.gen_range(1..100), pick(rng, EMAIL_DOMAINS))
}

/// 12-digit number with the Indian country code.
pub fn msisdn<R: Rng>(rng: &mut R) -> String {
    let leading = char::from(b'6' + rng.gen_range(0..4_u8));
    format!("91{leading}{}", bothify(rng, "#########"))
}

pub fn street_address<R: Rng>(rng: &mut R) -> String {
    format!("{} {}", rng.gen_range(1..999), pick(rng, STREET_NAMES))
}

pub fn city<R: Rng>(rng: &mut R) -> String {
    pick(rng, CITIES).to_string()
}

pub fn state<R: Rng>(rng: &mut R) -> String {
    pick(rng, STATES).to_string()
}

/// Six-digit PIN code; never starts with zero.
pub fn postcode<R: Rng>(rng: &mut R) -> String {
    format!("{}", rng.gen_range(110_000..=855_999))
}

/// Random RFC 4122 version 4 UUID string.
pub fn uuid4<R: Rng>(rng: &mut R) -> String {
    let bytes: [u8; 16] = rng.gen();
    uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
}

/// ULID string whose random component comes from `rng`.
pub fn ulid<R: Rng>(rng: &mut R, timestamp_ms: u64) -> String {
    ulid::Ulid::from_parts(timestamp_ms, rng.gen()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn matches_pattern(value: &str, pattern: &str) -> bool {
        value.len() == pattern.len()
            && value.chars().zip(pattern.chars()).all(|(ch, pat)| match pat {
                '?' => ch.is_ascii_uppercase(),
                '#' => ch.is_ascii_digit(),
                other => ch == other,
            })
    }

    proptest! {
        #[test]
        fn bothify_follows_pattern(seed in any::<u64>(), pattern in "[?#A-Z-]{0,20}") {
            let mut rng = StdRng::seed_from_u64(seed);
            let value = bothify(&mut rng, &pattern);
            prop_assert!(matches_pattern(&value, &pattern), "{value} vs {pattern}");
        }

        #[test]
        fn postcode_is_six_digits(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let pin = postcode(&mut rng);
            prop_assert_eq!(pin.len(), 6);
            prop_assert!(!pin.starts_with('0'));
        }
    }

    #[test]
    fn msisdn_has_country_code_and_twelve_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        let phone = msisdn(&mut rng);
        assert_eq!(phone.len(), 12);
        assert!(phone.starts_with("91"));
        assert!(phone.chars().all(|ch| ch.is_ascii_digit()));
    }

    #[test]
    fn email_is_addressable() {
        let mut rng = StdRng::seed_from_u64(11);
        let address = email(&mut rng);
        let Some((local, domain)) = address.split_once('@') else {
            panic!("missing @ in {address}");
        };
        assert!(!local.is_empty());
        assert!(EMAIL_DOMAINS.contains(&domain));
    }

    #[test]
    fn uuid4_is_version_four() {
        let mut rng = StdRng::seed_from_u64(3);
        let value = uuid4(&mut rng);
        let parsed = match uuid::Uuid::parse_str(&value) {
            Ok(parsed) => parsed,
            Err(err) => panic!("not a uuid: {value}: {err}"),
        };
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn same_seed_yields_same_company() {
        let mut left = StdRng::seed_from_u64(99);
        let mut right = StdRng::seed_from_u64(99);
        assert_eq!(company(&mut left), company(&mut right));
    }
}
