//! The closed set of currencies ExRate can resolve rates for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

macro_rules! currencies {
    ($($variant:ident => $code:literal, $name:literal;)+) => {
        /// ISO 4217 currency.
        ///
        /// The set is closed: codes outside it are rejected at the boundary by
        /// [`Currency::from_str`] rather than carried around as free-form strings.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum Currency {
            $(
                #[doc = $name]
                $variant,
            )+
        }

        impl Currency {
            /// Every known currency, in declaration order.
            pub const ALL: &'static [Currency] = &[$(Currency::$variant),+];

            /// Get the ISO 4217 code.
            pub fn code(&self) -> &'static str {
                match self {
                    $(Currency::$variant => $code,)+
                }
            }

            /// Get the English name.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Currency::$variant => $name,)+
                }
            }
        }
    };
}

currencies! {
    Aed => "AED", "UAE Dirham";
    Aud => "AUD", "Australian Dollar";
    Bgn => "BGN", "Bulgarian Lev";
    Bhd => "BHD", "Bahraini Dinar";
    Brl => "BRL", "Brazilian Real";
    Cad => "CAD", "Canadian Dollar";
    Chf => "CHF", "Swiss Franc";
    Cny => "CNY", "Chinese Yuan";
    Czk => "CZK", "Czech Koruna";
    Dkk => "DKK", "Danish Krone";
    Eur => "EUR", "Euro";
    Gbp => "GBP", "Pound Sterling";
    Hkd => "HKD", "Hong Kong Dollar";
    Huf => "HUF", "Hungarian Forint";
    Idr => "IDR", "Indonesian Rupiah";
    Ils => "ILS", "Israeli New Shekel";
    Inr => "INR", "Indian Rupee";
    Isk => "ISK", "Icelandic Krona";
    Jpy => "JPY", "Japanese Yen";
    Krw => "KRW", "South Korean Won";
    Kwd => "KWD", "Kuwaiti Dinar";
    Mxn => "MXN", "Mexican Peso";
    Myr => "MYR", "Malaysian Ringgit";
    Nok => "NOK", "Norwegian Krone";
    Nzd => "NZD", "New Zealand Dollar";
    Omr => "OMR", "Omani Rial";
    Php => "PHP", "Philippine Peso";
    Pln => "PLN", "Polish Zloty";
    Ron => "RON", "Romanian Leu";
    Sar => "SAR", "Saudi Riyal";
    Sek => "SEK", "Swedish Krona";
    Sgd => "SGD", "Singapore Dollar";
    Thb => "THB", "Thai Baht";
    Try => "TRY", "Turkish Lira";
    Usd => "USD", "US Dollar";
    Xaf => "XAF", "Central African CFA Franc";
    Xof => "XOF", "West African CFA Franc";
    Zar => "ZAR", "South African Rand";
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ParseError;

    /// Case-insensitive lookup of an ISO code. Surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.is_empty() {
            return Err(ParseError::EmptyCurrencyCode);
        }

        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| ParseError::UnknownCurrency(code.to_string()))
    }
}
