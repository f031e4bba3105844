//! Static scheme catalog and details records

use serde::Serialize;
use std::sync::OnceLock;

use super::{Criterion, Scheme};
use crate::agent::state::ProfileField;

/// Human-facing information about a scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemeDetails {
    pub name: &'static str,
    pub description: &'static str,
    pub benefits: &'static str,
    pub documents: &'static [&'static str],
    pub website: &'static str,
}

static SCHEMES: OnceLock<Vec<Scheme>> = OnceLock::new();

/// The five supported schemes, in presentation order
pub fn schemes() -> &'static [Scheme] {
    SCHEMES.get_or_init(|| {
        vec![
            Scheme {
                id: "pmay",
                name: "प्रधानमंत्री आवास योजना",
                criteria: vec![
                    Criterion::range(ProfileField::Income, None, Some(600000.0)),
                    Criterion::range(ProfileField::Age, Some(21.0), Some(70.0)),
                    Criterion::equals(ProfileField::OwnsHouse, false),
                ],
            },
            Scheme {
                id: "atal_pension",
                name: "अटल पेन्शन योजना",
                criteria: vec![Criterion::range(ProfileField::Age, Some(18.0), Some(40.0))],
            },
            Scheme {
                id: "pm_kisan",
                name: "पीएम किसान सम्मान निधी",
                criteria: vec![
                    Criterion::equals(ProfileField::Occupation, "farmer"),
                    Criterion::equals(ProfileField::LandOwnership, true),
                ],
            },
            Scheme {
                id: "sukanya_samriddhi",
                name: "सुकन्या समृद्धी योजना",
                criteria: vec![
                    Criterion::equals(ProfileField::HasDaughter, true),
                    Criterion::range(ProfileField::DaughterAge, None, Some(10.0))
                        .gated_by(ProfileField::HasDaughter),
                ],
            },
            Scheme {
                id: "ayushman_bharat",
                name: "आयुष्मान भारत योजना",
                criteria: vec![Criterion::range(ProfileField::Income, None, Some(100000.0))],
            },
        ]
    })
}

static DETAILS: [(&str, SchemeDetails); 5] = [
    (
        "pmay",
        SchemeDetails {
            name: "प्रधानमंत्री आवास योजना",
            description: "गरीब कुटुंबांना घर बांधण्यासाठी आर्थिक मदत",
            benefits: "घर बांधण्यासाठी २.५ लाख रुपयांपर्यंत अनुदान",
            documents: &[
                "आधार कार्ड",
                "उत्पन्न प्रमाणपत्र",
                "मूळ निवासी दाखला",
                "बँक खाते तपशील",
            ],
            website: "https://pmaymis.gov.in",
        },
    ),
    (
        "atal_pension",
        SchemeDetails {
            name: "अटल पेन्शन योजना",
            description: "वृद्धापकाळासाठी पेन्शन योजना",
            benefits: "६० वर्षानंतर हमीदार मासिक पेन्शन",
            documents: &["आधार कार्ड", "बँक खाते तपशील"],
            website: "https://www.npscra.nsdl.co.in/apy",
        },
    ),
    (
        "pm_kisan",
        SchemeDetails {
            name: "पीएम किसान सम्मान निधी",
            description: "शेतकऱ्यांना थेट आर्थिक मदत",
            benefits: "दरवर्षी ६००० रुपये तीन हप्त्यात",
            documents: &["आधार कार्ड", "जमीन मालकी कागदपत्रे", "बँक खाते तपशील"],
            website: "https://pmkisan.gov.in",
        },
    ),
    (
        "sukanya_samriddhi",
        SchemeDetails {
            name: "सुकन्या समृद्धी योजना",
            description: "मुलींच्या शिक्षण आणि लग्नासाठी बचत योजना",
            benefits: "उच्च व्याज दर आणि कर सवलत",
            documents: &["मुलीचा जन्म दाखला", "पालकांचे आधार कार्ड", "पालकांचे फोटो"],
            website: "https://www.nsiindia.gov.in",
        },
    ),
    (
        "ayushman_bharat",
        SchemeDetails {
            name: "आयुष्मान भारत योजना",
            description: "गरीब कुटुंबांसाठी आरोग्य विमा",
            benefits: "५ लाख रुपयांपर्यंत मोफत उपचार",
            documents: &["आधार कार्ड", "राशन कार्ड", "उत्पन्न प्रमाणपत्र"],
            website: "https://pmjay.gov.in",
        },
    ),
];

/// Scheme by exact id
pub fn find(id: &str) -> Option<&'static Scheme> {
    schemes().iter().find(|s| s.id == id)
}

/// Details record by scheme id
pub fn details(id: &str) -> Option<&'static SchemeDetails> {
    DETAILS
        .iter()
        .find(|(scheme_id, _)| *scheme_id == id)
        .map(|(_, details)| details)
}

/// Resolve a free-form mention (id or display name) to a catalog scheme.
pub fn resolve(mention: &str) -> Option<&'static Scheme> {
    let mention = mention.trim();
    if mention.is_empty() {
        return None;
    }
    schemes()
        .iter()
        .find(|s| s.id.eq_ignore_ascii_case(mention) || s.name == mention)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scheme_has_details() {
        for scheme in schemes() {
            let details = details(scheme.id).expect("details present");
            assert_eq!(details.name, scheme.name);
            assert!(!details.documents.is_empty());
        }
    }

    #[test]
    fn test_unknown_id_has_no_details() {
        assert!(details("free_laptop").is_none());
        assert!(find("free_laptop").is_none());
    }

    #[test]
    fn test_resolve_by_id_or_name() {
        assert_eq!(resolve("PM_KISAN").map(|s| s.id), Some("pm_kisan"));
        assert_eq!(resolve("अटल पेन्शन योजना").map(|s| s.id), Some("atal_pension"));
        assert!(resolve("").is_none());
    }

    #[test]
    fn test_details_serialize_with_documents() {
        let json = serde_json::to_value(details("pm_kisan").unwrap()).unwrap();
        assert_eq!(json["website"], "https://pmkisan.gov.in");
        assert_eq!(json["documents"].as_array().map(|d| d.len()), Some(3));
    }
}
