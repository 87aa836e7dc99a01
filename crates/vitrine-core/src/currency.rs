//! # Currency Module
//!
//! ISO 4217 currency registry and the `Currency` value type.
//!
//! ## How Lookup Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  currency("usd")                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize → "USD"                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  binary search in CURRENCIES (sorted by code)                           │
//! │       │                                                                 │
//! │       ├── found     → Currency { code: "USD", name: "US Dollar", $ }    │
//! │       └── not found → MoneyError::UnknownCurrency("usd")                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Currency` is a copyable handle to a registry entry. Two currencies are
//! equal iff their codes match. There is no implicit default currency here:
//! the store-wide default lives in [`crate::config::CoreConfig`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{MoneyError, MoneyResult};

// =============================================================================
// Currency Type
// =============================================================================

/// A currency from the static registry.
///
/// ## Example
/// ```rust
/// use vitrine_core::currency::currency;
///
/// let eur = currency("eur").unwrap();
/// assert_eq!(eur.code(), "EUR");
/// assert_eq!(eur.abbr(), "€");
///
/// let chf = currency("CHF").unwrap();
/// assert_eq!(chf.abbr(), "CHF"); // no symbol registered, falls back to code
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Currency {
    code: &'static str,
    name: &'static str,
    symbol: Option<&'static str>,
}

impl Currency {
    /// US Dollar, the stock default currency.
    pub const USD: Currency = Currency::registered("USD", "US Dollar", Some("$"));

    const fn registered(code: &'static str, name: &'static str, symbol: Option<&'static str>) -> Self {
        Currency { code, name, symbol }
    }

    /// Resolves a currency code against the registry.
    ///
    /// Codes are matched case-insensitively after trimming.
    pub fn from_code(code: &str) -> MoneyResult<Currency> {
        let normalized = code.trim().to_ascii_uppercase();
        CURRENCIES
            .binary_search_by(|c| c.code.cmp(normalized.as_str()))
            .map(|idx| CURRENCIES[idx])
            .map_err(|_| MoneyError::UnknownCurrency(code.to_string()))
    }

    /// Iterates over every registered currency in code order.
    pub fn all() -> impl Iterator<Item = Currency> {
        CURRENCIES.iter().copied()
    }

    /// ISO 4217 code, always uppercase.
    #[inline]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// English display name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Symbol, if one is registered.
    #[inline]
    pub const fn symbol(&self) -> Option<&'static str> {
        self.symbol
    }

    /// Short label for display: the symbol, or the code when there is none.
    pub fn abbr(&self) -> &'static str {
        self.symbol.unwrap_or(self.code)
    }
}

/// Resolves a currency code. Shorthand for [`Currency::from_code`].
pub fn currency(code: &str) -> MoneyResult<Currency> {
    Currency::from_code(code)
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Currency {}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl std::str::FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::from_code(s)
    }
}

/// Serialized as the bare code: `"USD"`.
impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Currency::from_code(&code).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Known currencies. MUST stay sorted by code (lookup is a binary search).
static CURRENCIES: &[Currency] = &[
    Currency::registered("AED", "UAE Dirham", None),
    Currency::registered("AFN", "Afghani", None),
    Currency::registered("ALL", "Lek", None),
    Currency::registered("AMD", "Armenian Dram", None),
    Currency::registered("ANG", "Netherlands Antillian Guilder", None),
    Currency::registered("AOA", "Kwanza", None),
    Currency::registered("ARS", "Argentine Peso", None),
    Currency::registered("AUD", "Australian Dollar", None),
    Currency::registered("AWG", "Aruban Guilder", None),
    Currency::registered("AZN", "Azerbaijanian Manat", None),
    Currency::registered("BAM", "Convertible Marks", None),
    Currency::registered("BBD", "Barbados Dollar", None),
    Currency::registered("BDT", "Taka", None),
    Currency::registered("BGN", "Bulgarian Lev", None),
    Currency::registered("BHD", "Bahraini Dinar", None),
    Currency::registered("BIF", "Burundi Franc", None),
    Currency::registered("BMD", "Bermudian Dollar", None),
    Currency::registered("BND", "Brunei Dollar", None),
    Currency::registered("BOB", "Boliviano", None),
    Currency::registered("BRL", "Brazilian Real", None),
    Currency::registered("BSD", "Bahamian Dollar", None),
    Currency::registered("BTN", "Bhutanese ngultrum", None),
    Currency::registered("BWP", "Pula", None),
    Currency::registered("BYR", "Belarussian Ruble", None),
    Currency::registered("BZD", "Belize Dollar", None),
    Currency::registered("CAD", "Canadian Dollar", None),
    Currency::registered("CDF", "Congolese franc", None),
    Currency::registered("CHF", "Swiss Franc", None),
    Currency::registered("CLP", "Chilean peso", None),
    Currency::registered("CNY", "Yuan Renminbi", None),
    Currency::registered("COP", "Colombian peso", None),
    Currency::registered("CRC", "Costa Rican Colon", None),
    Currency::registered("CUC", "Cuban convertible peso", None),
    Currency::registered("CUP", "Cuban Peso", None),
    Currency::registered("CVE", "Cape Verde Escudo", None),
    Currency::registered("CZK", "Czech Koruna", None),
    Currency::registered("DJF", "Djibouti Franc", None),
    Currency::registered("DKK", "Danish Krone", Some("kr")),
    Currency::registered("DOP", "Dominican Peso", None),
    Currency::registered("DZD", "Algerian Dinar", None),
    Currency::registered("EGP", "Egyptian Pound", None),
    Currency::registered("ERN", "Nakfa", None),
    Currency::registered("ETB", "Ethiopian Birr", None),
    Currency::registered("EUR", "Euro", Some("€")),
    Currency::registered("FJD", "Fiji Dollar", None),
    Currency::registered("FKP", "Falkland Islands Pound", None),
    Currency::registered("GBP", "Pound Sterling", Some("£")),
    Currency::registered("GEL", "Lari", None),
    Currency::registered("GHS", "Ghana Cedi", None),
    Currency::registered("GIP", "Gibraltar Pound", None),
    Currency::registered("GMD", "Dalasi", None),
    Currency::registered("GNF", "Guinea Franc", None),
    Currency::registered("GTQ", "Quetzal", None),
    Currency::registered("GYD", "Guyana Dollar", None),
    Currency::registered("HKD", "Hong Kong Dollar", None),
    Currency::registered("HNL", "Lempira", None),
    Currency::registered("HRK", "Croatian Kuna", None),
    Currency::registered("HTG", "Haitian gourde", None),
    Currency::registered("HUF", "Forint", None),
    Currency::registered("IDR", "Rupiah", None),
    Currency::registered("ILS", "New Israeli Sheqel", None),
    Currency::registered("IMP", "Isle of Man Pound", None),
    Currency::registered("INR", "Indian Rupee", None),
    Currency::registered("IQD", "Iraqi Dinar", None),
    Currency::registered("IRR", "Iranian Rial", None),
    Currency::registered("ISK", "Iceland Krona", None),
    Currency::registered("JMD", "Jamaican Dollar", None),
    Currency::registered("JOD", "Jordanian Dinar", None),
    Currency::registered("JPY", "Yen", Some("¥")),
    Currency::registered("KES", "Kenyan Shilling", None),
    Currency::registered("KGS", "Som", None),
    Currency::registered("KHR", "Riel", None),
    Currency::registered("KMF", "Comoro Franc", None),
    Currency::registered("KPW", "North Korean Won", None),
    Currency::registered("KRW", "Won", None),
    Currency::registered("KWD", "Kuwaiti Dinar", None),
    Currency::registered("KYD", "Cayman Islands Dollar", None),
    Currency::registered("KZT", "Tenge", None),
    Currency::registered("LAK", "Kip", None),
    Currency::registered("LBP", "Lebanese Pound", None),
    Currency::registered("LKR", "Sri Lanka Rupee", None),
    Currency::registered("LRD", "Liberian Dollar", None),
    Currency::registered("LSL", "Lesotho loti", None),
    Currency::registered("LTL", "Lithuanian Litas", None),
    Currency::registered("LVL", "Latvian Lats", None),
    Currency::registered("LYD", "Libyan Dinar", None),
    Currency::registered("MAD", "Moroccan Dirham", None),
    Currency::registered("MDL", "Moldovan Leu", None),
    Currency::registered("MGA", "Malagasy Ariary", None),
    Currency::registered("MKD", "Denar", None),
    Currency::registered("MMK", "Kyat", None),
    Currency::registered("MNT", "Tugrik", None),
    Currency::registered("MOP", "Pataca", None),
    Currency::registered("MRO", "Ouguiya", None),
    Currency::registered("MUR", "Mauritius Rupee", None),
    Currency::registered("MVR", "Rufiyaa", None),
    Currency::registered("MWK", "Kwacha", None),
    Currency::registered("MXN", "Mexican Peso", None),
    Currency::registered("MYR", "Malaysian Ringgit", None),
    Currency::registered("MZN", "Metical", None),
    Currency::registered("NAD", "Namibian Dollar", None),
    Currency::registered("NGN", "Naira", None),
    Currency::registered("NIO", "Cordoba Oro", None),
    Currency::registered("NOK", "Norwegian Krone", Some("kr")),
    Currency::registered("NPR", "Nepalese Rupee", None),
    Currency::registered("NZD", "New Zealand Dollar", None),
    Currency::registered("OMR", "Rial Omani", None),
    Currency::registered("PAB", "Panamanian Balboa", None),
    Currency::registered("PEN", "Nuevo Sol", None),
    Currency::registered("PGK", "Kina", None),
    Currency::registered("PHP", "Philippine Peso", None),
    Currency::registered("PKR", "Pakistan Rupee", None),
    Currency::registered("PLN", "Zloty", None),
    Currency::registered("PYG", "Guarani", None),
    Currency::registered("QAR", "Qatari Rial", None),
    Currency::registered("RON", "New Leu", None),
    Currency::registered("RSD", "Serbian Dinar", None),
    Currency::registered("RUB", "Russian Ruble", None),
    Currency::registered("RWF", "Rwanda Franc", None),
    Currency::registered("SAR", "Saudi Riyal", None),
    Currency::registered("SBD", "Solomon Islands Dollar", None),
    Currency::registered("SCR", "Seychelles Rupee", None),
    Currency::registered("SDG", "Sudanese Pound", None),
    Currency::registered("SEK", "Swedish Krona", Some("kr")),
    Currency::registered("SGD", "Singapore Dollar", None),
    Currency::registered("SHP", "Saint Helena Pound", None),
    Currency::registered("SKK", "Slovak Koruna", None),
    Currency::registered("SLL", "Leone", None),
    Currency::registered("SOS", "Somali Shilling", None),
    Currency::registered("SRD", "Surinam Dollar", None),
    Currency::registered("STD", "Dobra", None),
    Currency::registered("SVC", "Salvadoran Colon", None),
    Currency::registered("SYP", "Syrian Pound", None),
    Currency::registered("SZL", "Lilangeni", None),
    Currency::registered("THB", "Baht", None),
    Currency::registered("TJS", "Somoni", None),
    Currency::registered("TMM", "Manat", None),
    Currency::registered("TND", "Tunisian Dinar", None),
    Currency::registered("TOP", "Paanga", None),
    Currency::registered("TRY", "New Turkish Lira", None),
    Currency::registered("TTD", "Trinidad and Tobago Dollar", None),
    Currency::registered("TVD", "Tuvalu dollar", None),
    Currency::registered("TWD", "New Taiwan Dollar", None),
    Currency::registered("TZS", "Tanzanian Shilling", None),
    Currency::registered("UAH", "Hryvnia", None),
    Currency::registered("UGX", "Uganda Shilling", None),
    Currency::registered("USD", "US Dollar", Some("$")),
    Currency::registered("UYU", "Uruguayan peso", None),
    Currency::registered("UZS", "Uzbekistan Sum", None),
    Currency::registered("VEB", "Venezuelan bolivar", None),
    Currency::registered("VEF", "Bolivar Fuerte", None),
    Currency::registered("VND", "Dong", None),
    Currency::registered("VUV", "Vatu", None),
    Currency::registered("WST", "Tala", None),
    Currency::registered("XAF", "CFA franc BEAC", None),
    Currency::registered("XAG", "Silver", None),
    Currency::registered("XAU", "Gold", None),
    Currency::registered("XBA", "Bond Markets Units European Composite Unit (EURCO)", None),
    Currency::registered("XBB", "European Monetary Unit (E.M.U.-6)", None),
    Currency::registered("XBC", "European Unit of Account 9(E.U.A.-9)", None),
    Currency::registered("XBD", "European Unit of Account 17(E.U.A.-17)", None),
    Currency::registered("XCD", "East Caribbean Dollar", None),
    Currency::registered("XDR", "SDR", None),
    Currency::registered("XFO", "Gold-Franc", None),
    Currency::registered("XFU", "UIC-Franc", None),
    Currency::registered("XOF", "CFA Franc BCEAO", None),
    Currency::registered("XPD", "Palladium", None),
    Currency::registered("XPF", "CFP Franc", None),
    Currency::registered("XPT", "Platinum", None),
    Currency::registered("XTS", "Codes specifically reserved for testing purposes", None),
    Currency::registered("YER", "Yemeni Rial", None),
    Currency::registered("ZAR", "Rand", None),
    Currency::registered("ZMK", "Kwacha", None),
    Currency::registered("ZWD", "Zimbabwe Dollar A/06", None),
    Currency::registered("ZWL", "Zimbabwe dollar A/09", None),
    Currency::registered("ZWN", "Zimbabwe dollar A/08", None),
];

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_sorted_and_unique() {
        for pair in CURRENCIES.windows(2) {
            assert!(pair[0].code < pair[1].code, "{} >= {}", pair[0].code, pair[1].code);
        }
        assert!(CURRENCIES.len() > 170);
        assert!(CURRENCIES.iter().all(|c| c.code.len() == 3));
    }

    #[test]
    fn test_lookup() {
        let usd = currency("USD").unwrap();
        assert_eq!(usd.code(), "USD");
        assert_eq!(usd.name(), "US Dollar");
        assert_eq!(usd.symbol(), Some("$"));

        assert_eq!(currency(" sek ").unwrap().code(), "SEK");
    }

    #[test]
    fn test_unknown_currency() {
        let err = currency("ZZZ").unwrap_err();
        assert_eq!(err, MoneyError::UnknownCurrency("ZZZ".to_string()));
        assert!(currency("").is_err());
        assert!(currency("USDX").is_err());
    }

    #[test]
    fn test_equality_is_code_based() {
        assert_eq!(currency("usd").unwrap(), currency("USD").unwrap());
        assert_ne!(currency("USD").unwrap(), currency("EUR").unwrap());
    }

    #[test]
    fn test_abbr_falls_back_to_code() {
        assert_eq!(currency("EUR").unwrap().abbr(), "€");
        assert_eq!(currency("NZD").unwrap().abbr(), "NZD");
    }

    #[test]
    fn test_serde_as_code() {
        let eur = currency("EUR").unwrap();
        assert_eq!(serde_json::to_string(&eur).unwrap(), "\"EUR\"");

        let back: Currency = serde_json::from_str("\"eur\"").unwrap();
        assert_eq!(back, eur);

        assert!(serde_json::from_str::<Currency>("\"ZZZ\"").is_err());
    }
}
