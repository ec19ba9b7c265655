//! Indian states / union territories with their GST state codes.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use pharmabill_core::DomainError;

macro_rules! regions {
    ($( $variant:ident => ($name:literal, $code:literal) ),+ $(,)?) => {
        /// Region (state / UT) of a counterparty or of the issuer.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Region {
            $( $variant, )+
        }

        impl Region {
            /// Every supported region, in display order.
            pub const ALL: &'static [Region] = &[ $( Region::$variant, )+ ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Region::$variant => $name, )+
                }
            }

            /// Two-digit GST state code (the first two characters of a GSTIN).
            pub fn gst_code(&self) -> &'static str {
                match self {
                    $( Region::$variant => $code, )+
                }
            }
        }
    };
}

regions! {
    AndhraPradesh => ("Andhra Pradesh", "37"),
    ArunachalPradesh => ("Arunachal Pradesh", "12"),
    Assam => ("Assam", "18"),
    Bihar => ("Bihar", "10"),
    Chhattisgarh => ("Chhattisgarh", "22"),
    Goa => ("Goa", "30"),
    Gujarat => ("Gujarat", "24"),
    Haryana => ("Haryana", "06"),
    HimachalPradesh => ("Himachal Pradesh", "02"),
    Jharkhand => ("Jharkhand", "20"),
    Karnataka => ("Karnataka", "29"),
    Kerala => ("Kerala", "32"),
    MadhyaPradesh => ("Madhya Pradesh", "23"),
    Maharashtra => ("Maharashtra", "27"),
    Manipur => ("Manipur", "14"),
    Meghalaya => ("Meghalaya", "17"),
    Mizoram => ("Mizoram", "15"),
    Nagaland => ("Nagaland", "13"),
    Odisha => ("Odisha", "21"),
    Punjab => ("Punjab", "03"),
    Rajasthan => ("Rajasthan", "08"),
    Sikkim => ("Sikkim", "11"),
    TamilNadu => ("Tamil Nadu", "33"),
    Telangana => ("Telangana", "36"),
    Tripura => ("Tripura", "16"),
    UttarPradesh => ("Uttar Pradesh", "09"),
    Uttarakhand => ("Uttarakhand", "05"),
    WestBengal => ("West Bengal", "19"),
    Delhi => ("Delhi", "07"),
}

impl Default for Region {
    fn default() -> Self {
        Region::Maharashtra
    }
}

impl core::fmt::Display for Region {
    /// `Maharashtra (27)`
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.name(), self.gst_code())
    }
}

impl FromStr for Region {
    type Err = DomainError;

    /// Accepts a region name (case-insensitive) or its GST state code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Region::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(s) || r.gst_code() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown region: {s}")))
    }
}
