//! Built-in ontology tables for hydraulic components and household appliances
//!
//! German manual vocabulary first, with the English terms that show up in
//! bilingual data sheets.

use super::ontology::{ConceptPattern, CrossDomainRule, Ontology};
use std::collections::BTreeMap;

fn table(entries: Vec<(&str, ConceptPattern)>) -> Ontology {
    Ontology::new(
        entries
            .into_iter()
            .map(|(name, pattern)| (name.to_string(), pattern))
            .collect::<BTreeMap<_, _>>(),
    )
}

pub fn hydraulic() -> Ontology {
    table(vec![
        (
            "druck",
            ConceptPattern::new(
                &["druck", "nenndruck", "betriebsdruck", "prüfdruck", "berstdruck", "pressure", "pmax", "p_max"],
                &["druck", "betriebsdruck", "prüfdruck", "berstdruck", "nenndruck", "pressure", "p_max"],
                &["bar", "mpa", "psi", "druckstufe"],
                1.5,
            ),
        ),
        (
            "volumenstrom",
            ConceptPattern::new(
                &["volumenstrom", "förderstrom", "durchfluss", "durchflussmenge", "flow", "l/min"],
                &["volumenstrom", "förderstrom", "durchfluss", "flow rate"],
                &["l/min", "gpm", "nenngröße"],
                1.3,
            ),
        ),
        (
            "dichtung",
            ConceptPattern::new(
                &["dichtung", "dichtungen", "dichtsatz", "o-ring", "nutring", "abstreifer", "seal", "seals"],
                &["dichtung", "dichtungssatz", "o-ring", "nutring", "abstreifer", "seal kit"],
                &["dichtungswerkstoff", "nbr", "fkm", "leckage"],
                1.2,
            ),
        ),
        (
            "typenschlüssel",
            ConceptPattern::new(
                &["typenschlüssel", "typschlüssel", "bestellangabe", "bestellschlüssel", "typenbezeichnung"],
                &["typenschlüssel", "bestellangabe", "bestellbeispiel", "type code"],
                &["baureihe", "nenngröße", "ausführung"],
                1.0,
            ),
        ),
        (
            "zylinder",
            ConceptPattern::new(
                &[
                    "zylinder",
                    "hydraulikzylinder",
                    "cdh1",
                    "cdh2",
                    "cdh3",
                    "cgh2",
                    "cdt3",
                    "kolben",
                    "kolbenstange",
                ],
                &["zylinder", "hydraulikzylinder", "kolbenstange", "kolben", "cylinder"],
                &["hub", "kolbendurchmesser", "stangendurchmesser", "endlagendämpfung"],
                1.3,
            ),
        ),
        (
            "ventil",
            ConceptPattern::new(
                &["ventil", "wegeventil", "druckventil", "rückschlagventil", "proportionalventil", "valve"],
                &["ventil", "wegeventil", "druckbegrenzungsventil", "rückschlagventil", "valve"],
                &["schaltsymbol", "steuerschieber", "magnet"],
                1.1,
            ),
        ),
        (
            "pumpe",
            ConceptPattern::new(
                &["pumpe", "hydraulikpumpe", "axialkolbenpumpe", "zahnradpumpe", "flügelzellenpumpe", "pump"],
                &["pumpe", "hydraulikpumpe", "axialkolbenpumpe", "zahnradpumpe", "pump"],
                &["fördervolumen", "drehzahl", "saugleitung"],
                1.1,
            ),
        ),
        (
            "hydraulikflüssigkeit",
            ConceptPattern::new(
                &["hydraulikflüssigkeit", "hydrauliköl", "druckflüssigkeit", "öl", "viskosität", "hlp", "fluid"],
                &["hydraulikflüssigkeit", "hydrauliköl", "druckflüssigkeit", "mineralöl", "hlp"],
                &["viskosität", "reinheitsklasse", "temperaturbereich"],
                1.0,
            ),
        ),
    ])
}

pub fn appliance() -> Ontology {
    table(vec![
        (
            "temperaturanzeige",
            ConceptPattern::new(
                &["temperaturanzeige", "anzeige", "display", "temperatur", "thermometer"],
                &["temperaturanzeige", "anzeige", "display", "temperaturdisplay"],
                &["grad", "celsius", "solltemperatur"],
                1.4,
            ),
        ),
        (
            "sensor",
            ConceptPattern::new(
                &[
                    "sensor",
                    "temperatursonde",
                    "bakesensor",
                    "backsensor",
                    "temperaturfühler",
                    "kerntemperaturfühler",
                    "fühler",
                    "sonde",
                ],
                &["sensor", "temperatursonde", "bakesensor", "fühler", "kerntemperaturfühler"],
                &["temperatursondenbuchse", "messwert", "kalibrierung"],
                1.3,
            ),
        ),
        (
            "programm",
            ConceptPattern::new(
                &["programm", "programme", "betriebsart", "heißluft", "umluft", "oberhitze", "unterhitze", "grill"],
                &["programm", "betriebsart", "backprogramm", "automatikprogramm"],
                &["programmwahl", "garzeit", "vorheizen"],
                1.0,
            ),
        ),
        (
            "fehlercode",
            ConceptPattern::new(
                &["fehlercode", "störungscode", "fehlermeldung", "störung", "fehler", "error"],
                &["fehlercode", "störungscode", "fehlermeldung", "error code", "e-", "f-"],
                &["störungsbehebung", "kundendienst", "reset"],
                1.6,
            ),
        ),
        (
            "tür",
            ConceptPattern::new(
                &["tür", "gerätetür", "backofentür", "türdichtung", "türverriegelung", "türschloss", "door"],
                &["tür", "gerätetür", "türverriegelung", "türdichtung"],
                &["scharnier", "türscheibe", "kindersicherung"],
                0.9,
            ),
        ),
        (
            "reinigung",
            ConceptPattern::new(
                &["reinigung", "reinigen", "pyrolyse", "entkalken", "entkalkung", "cleaning"],
                &["reinigung", "pyrolyse", "selbstreinigung", "entkalkung"],
                &["reinigungsmittel", "filter", "backblech"],
                0.8,
            ),
        ),
        (
            "wasserzulauf",
            ConceptPattern::new(
                &["wasserzulauf", "wasserablauf", "zulaufschlauch", "ablaufschlauch", "laugenpumpe", "aquastop", "abpumpen"],
                &["wasserzulauf", "wasserablauf", "zulaufschlauch", "ablaufschlauch", "aquastop"],
                &["wasserhahn", "siphon", "wasserdruck"],
                1.0,
            ),
        ),
        (
            "heizelement",
            ConceptPattern::new(
                &["heizelement", "heizung", "heizkörper", "heizstab", "ringheizkörper", "heating"],
                &["heizelement", "heizkörper", "heizstab", "ringheizkörper"],
                &["heizleistung", "thermostat", "überhitzungsschutz"],
                1.2,
            ),
        ),
    ])
}

pub fn rules() -> Vec<CrossDomainRule> {
    vec![
        // Oven display shows the probe reading; manuals list the socket under the display unit
        CrossDomainRule::all(
            &["temperaturanzeige", "sensor"],
            &[
                "temperatursonde",
                "bakesensor",
                "temperatursondenbuchse",
                "steckbuchse",
                "anzeigeeinheit",
                "display",
                "sens",
            ],
            1.0,
        ),
        CrossDomainRule::any(
            &["fehlercode", "error code", "e-", "f-", "störungscode"],
            &["display", "anzeigeeinheit", "störungscode", "codeanzeige"],
            0.8,
        ),
        CrossDomainRule::all(&["druck", "dichtung"], &["leckage", "undichtigkeit", "druckverlust"], 0.6),
        CrossDomainRule::all(
            &["pumpe", "volumenstrom"],
            &["fördervolumen", "verdrängervolumen", "drehzahl"],
            0.5,
        ),
        CrossDomainRule::all(
            &["heizelement", "temperaturanzeige"],
            &["solltemperatur", "thermostat", "aufheizzeit"],
            0.5,
        ),
    ]
}
