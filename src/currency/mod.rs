//! Supported currencies and the static currency -> flag code table.
//!
//! The table order is the order options appear in the selectors, so it
//! is kept as a slice rather than a map.

pub mod flags;

use std::fmt;

/// Currency code -> two-letter country code used for the flag image.
const COUNTRY_LIST: &[(&str, &str)] = &[
    ("AED", "AE"), ("AFN", "AF"), ("XCD", "AG"), ("ALL", "AL"), ("AMD", "AM"),
    ("ANG", "AN"), ("AOA", "AO"), ("AQD", "AQ"), ("ARS", "AR"), ("AUD", "AU"),
    ("AZN", "AZ"), ("BAM", "BA"), ("BBD", "BB"), ("BDT", "BD"), ("XOF", "BE"),
    ("BGN", "BG"), ("BHD", "BH"), ("BIF", "BI"), ("BMD", "BM"), ("BND", "BN"),
    ("BOB", "BO"), ("BRL", "BR"), ("BSD", "BS"), ("NOK", "BV"), ("BWP", "BW"),
    ("BYR", "BY"), ("BZD", "BZ"), ("CAD", "CA"), ("CDF", "CD"), ("XAF", "CF"),
    ("CHF", "CH"), ("CLP", "CL"), ("CNY", "CN"), ("COP", "CO"), ("CRC", "CR"),
    ("CUP", "CU"), ("CVE", "CV"), ("CYP", "CY"), ("CZK", "CZ"), ("DJF", "DJ"),
    ("DKK", "DK"), ("DOP", "DO"), ("DZD", "DZ"), ("ECS", "EC"), ("EEK", "EE"),
    ("EGP", "EG"), ("ETB", "ET"), ("EUR", "FR"), ("FJD", "FJ"), ("FKP", "FK"),
    ("GBP", "GB"), ("GEL", "GE"), ("GGP", "GG"), ("GHS", "GH"), ("GIP", "GI"),
    ("GMD", "GM"), ("GNF", "GN"), ("GTQ", "GT"), ("GYD", "GY"), ("HKD", "HK"),
    ("HNL", "HN"), ("HRK", "HR"), ("HTG", "HT"), ("HUF", "HU"), ("IDR", "ID"),
    ("ILS", "IL"), ("INR", "IN"), ("IQD", "IQ"), ("IRR", "IR"), ("ISK", "IS"),
    ("JMD", "JM"), ("JOD", "JO"), ("JPY", "JP"), ("KES", "KE"), ("KGS", "KG"),
    ("KHR", "KH"), ("KMF", "KM"), ("KPW", "KP"), ("KRW", "KR"), ("KWD", "KW"),
    ("KYD", "KY"), ("KZT", "KZ"), ("LAK", "LA"), ("LBP", "LB"), ("LKR", "LK"),
    ("LRD", "LR"), ("LSL", "LS"), ("LTL", "LT"), ("LVL", "LV"), ("LYD", "LY"),
    ("MAD", "MA"), ("MDL", "MD"), ("MGA", "MG"), ("MKD", "MK"), ("MMK", "MM"),
    ("MNT", "MN"), ("MOP", "MO"), ("MRO", "MR"), ("MTL", "MT"), ("MUR", "MU"),
    ("MVR", "MV"), ("MWK", "MW"), ("MXN", "MX"), ("MYR", "MY"), ("MZN", "MZ"),
    ("NAD", "NA"), ("XPF", "NC"), ("NGN", "NG"), ("NIO", "NI"), ("NPR", "NP"),
    ("NZD", "NZ"), ("OMR", "OM"), ("PAB", "PA"), ("PEN", "PE"), ("PGK", "PG"),
    ("PHP", "PH"), ("PKR", "PK"), ("PLN", "PL"), ("PYG", "PY"), ("QAR", "QA"),
    ("RON", "RO"), ("RSD", "RS"), ("RUB", "RU"), ("RWF", "RW"), ("SAR", "SA"),
    ("SBD", "SB"), ("SCR", "SC"), ("SDG", "SD"), ("SEK", "SE"), ("SGD", "SG"),
    ("SKK", "SK"), ("SLL", "SL"), ("SOS", "SO"), ("SRD", "SR"), ("STD", "ST"),
    ("SVC", "SV"), ("SYP", "SY"), ("SZL", "SZ"), ("THB", "TH"), ("TJS", "TJ"),
    ("TMT", "TM"), ("TND", "TN"), ("TOP", "TO"), ("TRY", "TR"), ("TTD", "TT"),
    ("TWD", "TW"), ("TZS", "TZ"), ("UAH", "UA"), ("UGX", "UG"), ("USD", "US"),
    ("UYU", "UY"), ("UZS", "UZ"), ("VEF", "VE"), ("VND", "VN"), ("VUV", "VU"),
    ("YER", "YE"), ("ZAR", "ZA"), ("ZMK", "ZM"), ("ZWD", "ZW"),
];

/// A currency from the supported set. Only constructible from a table entry,
/// so every `Currency` is guaranteed to have a flag code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Currency {
    index: usize,
}

impl Currency {
    /// Look up a supported currency by its ISO-4217 code (case-insensitive)
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        COUNTRY_LIST
            .iter()
            .position(|(c, _)| c.eq_ignore_ascii_case(code))
            .map(|index| Self { index })
    }

    /// All supported currencies in selector order
    pub fn all() -> impl Iterator<Item = Currency> {
        (0..COUNTRY_LIST.len()).map(|index| Self { index })
    }

    pub fn count() -> usize {
        COUNTRY_LIST.len()
    }

    pub fn code(&self) -> &'static str {
        COUNTRY_LIST[self.index].0
    }

    pub fn flag_code(&self) -> &'static str {
        COUNTRY_LIST[self.index].1
    }

    /// Position in selector order
    pub fn position(&self) -> usize {
        self.index
    }

    /// Next currency in selector order, wrapping around
    pub fn next(&self) -> Self {
        Self { index: (self.index + 1) % COUNTRY_LIST.len() }
    }

    /// Previous currency in selector order, wrapping around
    pub fn prev(&self) -> Self {
        Self {
            index: self.index.checked_sub(1).unwrap_or(COUNTRY_LIST.len() - 1),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Flag code for an arbitrary currency code, `None` when the table has no entry
pub fn flag_code(code: &str) -> Option<&'static str> {
    Currency::parse(code).map(|c| c.flag_code())
}
