//! Fixed translations for standard listing terms. No API call needed.

use super::data::Lang;

const ES_TERMS: &[(&str, &str)] = &[
    ("Single Family", "Casa Unifamiliar"),
    ("Condo", "Condominio"),
    ("Townhouse", "Casa Adosada"),
    ("Villa", "Villa"),
    ("Multi-Family", "Multifamiliar"),
    ("Land", "Terreno"),
    ("Commercial", "Comercial"),
    ("For Sale", "En Venta"),
    ("Active", "Activo"),
    ("Pending", "Pendiente"),
    ("Sold", "Vendido"),
    ("Waterfront", "Frente al Agua"),
];

/// Glossary entry for `term`, if it is a standard term.
pub fn lookup_term(term: &str, lang: Lang) -> Option<&'static str> {
    let (en, es) = ES_TERMS.iter().find(|(en, _)| *en == term)?;
    Some(match lang {
        Lang::En => en,
        Lang::Es => es,
    })
}

/// Translate a property type or status. Unknown terms come back unchanged.
pub fn translate_term(term: &str, lang: Lang) -> &str {
    lookup_term(term, lang).unwrap_or(term)
}
