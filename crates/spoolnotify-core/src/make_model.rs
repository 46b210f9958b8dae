// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Splitting a spooler `printer-make-and-model` string into manufacturer and
// model, for display in notifications.

/// Manufacturers whose name contains a space, or which go by a shorter name.
const MAKE_ALIASES: &[(&str, &str)] = &[
    ("hewlett-packard", "HP"),
    ("hewlett packard", "HP"),
    ("konica minolta", "Konica Minolta"),
    ("minolta-qms", "Minolta-QMS"),
    ("kyocera mita", "Kyocera"),
    ("lexmark international", "Lexmark"),
    ("fuji xerox", "Fuji Xerox"),
    ("oki data", "Oki"),
];

/// Driver suffixes appended to the model by various driver packages.
const DRIVER_SUFFIXES: &[&str] = &[
    " foomatic/",
    " - cups+gutenprint",
    " cups+gutenprint",
    " gutenprint",
    " (recommended)",
    " postscript",
    " hpijs",
    " hpcups",
    " pxlmono",
    " pxlcolor",
];

/// Split `make_and_model` into `(make, model)`.
///
/// The make is normalised (e.g. "Hewlett-Packard" becomes "HP"), the model
/// has driver suffixes removed and never repeats the make.
pub fn split_make_model(make_and_model: &str) -> (String, String) {
    let trimmed = make_and_model.trim();
    let lower = trimmed.to_ascii_lowercase();

    let (make, rest) = MAKE_ALIASES
        .iter()
        .find(|(prefix, _)| {
            lower.starts_with(prefix)
                && lower[prefix.len()..]
                    .chars()
                    .next()
                    .is_none_or(|c| c == ' ' || c == '_')
        })
        .map(|(prefix, make)| (make.to_string(), &trimmed[prefix.len()..]))
        .unwrap_or_else(|| match trimmed.split_once([' ', '_']) {
            Some((make, rest)) => (make.to_string(), rest),
            None => (trimmed.to_string(), ""),
        });

    let mut model = rest.trim_start_matches([' ', '_']).to_string();

    // Some drivers repeat the manufacturer at the start of the model.
    if model
        .to_ascii_lowercase()
        .starts_with(&format!("{} ", make.to_ascii_lowercase()))
    {
        model = model[make.len() + 1..].to_string();
    }

    if let Some(idx) = model.find(',') {
        model.truncate(idx);
    }
    let model_lower = model.to_ascii_lowercase();
    if let Some(idx) = DRIVER_SUFFIXES
        .iter()
        .filter_map(|suffix| model_lower.find(suffix))
        .min()
    {
        model.truncate(idx);
    }

    (make, model.trim().to_string())
}

/// The "make model" string shown to the user.
pub fn display_driver_name(make_and_model: &str) -> String {
    let (make, model) = split_make_model(make_and_model);
    if model.is_empty() {
        make
    } else {
        format!("{make} {model}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_make_and_model() {
        assert_eq!(
            split_make_model("Epson Stylus Photo R300"),
            ("Epson".into(), "Stylus Photo R300".into())
        );
    }

    #[test]
    fn hewlett_packard_becomes_hp() {
        let (make, model) = split_make_model("Hewlett-Packard LaserJet 4050");
        assert_eq!(make, "HP");
        assert_eq!(model, "LaserJet 4050");
    }

    #[test]
    fn driver_suffix_is_dropped() {
        assert_eq!(
            display_driver_name("HP LaserJet 1020 Foomatic/foo2zjs-z1 (recommended)"),
            "HP LaserJet 1020"
        );
        assert_eq!(
            display_driver_name("Canon PIXMA iP4200 - CUPS+Gutenprint v5.3.4"),
            "Canon PIXMA iP4200"
        );
        assert_eq!(
            display_driver_name("HP Color LaserJet cm1312nfi mfp, hpcups 3.22.10"),
            "HP Color LaserJet cm1312nfi mfp"
        );
    }

    #[test]
    fn repeated_make_is_removed() {
        assert_eq!(
            split_make_model("Kyocera Mita Kyocera FS-1020D"),
            ("Kyocera".into(), "FS-1020D".into())
        );
    }

    #[test]
    fn two_word_make_kept_together() {
        assert_eq!(
            split_make_model("Konica Minolta magicolor 2430DL"),
            ("Konica Minolta".into(), "magicolor 2430DL".into())
        );
    }

    #[test]
    fn single_word_has_empty_model() {
        assert_eq!(split_make_model("Generic"), ("Generic".into(), String::new()));
        assert_eq!(display_driver_name("Generic"), "Generic");
    }
}
