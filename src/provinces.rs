//! Static province table used to abbreviate first-level admin areas.
//!
//! Names are matched against the ASCII name column of the GeoNames
//! `admin1CodesASCII.txt` feed. `english` takes precedence over `name` when
//! present.

/// A province, state or territory with its short abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Province {
    /// ISO 3166-1 alpha-2 country code
    pub country: &'static str,
    /// Native name
    pub name: &'static str,
    /// English name, when it differs from the native one
    pub english: Option<&'static str>,
    /// Short abbreviation (postal or ISO 3166-2 subdivision code)
    pub short: &'static str,
}

impl Province {
    /// Name used for matching against the admin-area feed.
    pub fn match_name(&self) -> &'static str {
        self.english.unwrap_or(self.name)
    }
}

const fn province(country: &'static str, name: &'static str, short: &'static str) -> Province {
    Province { country, name, english: None, short }
}

const fn translated(
    country: &'static str,
    name: &'static str,
    english: &'static str,
    short: &'static str,
) -> Province {
    Province { country, name, english: Some(english), short }
}

pub static PROVINCES: &[Province] = &[
    // Australia
    province("AU", "Australian Capital Territory", "ACT"),
    province("AU", "New South Wales", "NSW"),
    province("AU", "Northern Territory", "NT"),
    province("AU", "Queensland", "QLD"),
    province("AU", "South Australia", "SA"),
    province("AU", "Tasmania", "TAS"),
    province("AU", "Victoria", "VIC"),
    province("AU", "Western Australia", "WA"),
    // Brazil
    province("BR", "Acre", "AC"),
    province("BR", "Alagoas", "AL"),
    translated("BR", "Amapá", "Amapa", "AP"),
    province("BR", "Amazonas", "AM"),
    province("BR", "Bahia", "BA"),
    translated("BR", "Ceará", "Ceara", "CE"),
    translated("BR", "Distrito Federal", "Federal District", "DF"),
    translated("BR", "Espírito Santo", "Espirito Santo", "ES"),
    translated("BR", "Goiás", "Goias", "GO"),
    translated("BR", "Maranhão", "Maranhao", "MA"),
    province("BR", "Mato Grosso", "MT"),
    province("BR", "Mato Grosso do Sul", "MS"),
    province("BR", "Minas Gerais", "MG"),
    translated("BR", "Pará", "Para", "PA"),
    translated("BR", "Paraíba", "Paraiba", "PB"),
    translated("BR", "Paraná", "Parana", "PR"),
    province("BR", "Pernambuco", "PE"),
    translated("BR", "Piauí", "Piaui", "PI"),
    province("BR", "Rio de Janeiro", "RJ"),
    province("BR", "Rio Grande do Norte", "RN"),
    province("BR", "Rio Grande do Sul", "RS"),
    translated("BR", "Rondônia", "Rondonia", "RO"),
    province("BR", "Roraima", "RR"),
    province("BR", "Santa Catarina", "SC"),
    translated("BR", "São Paulo", "Sao Paulo", "SP"),
    province("BR", "Sergipe", "SE"),
    province("BR", "Tocantins", "TO"),
    // Canada
    province("CA", "Alberta", "AB"),
    province("CA", "British Columbia", "BC"),
    province("CA", "Manitoba", "MB"),
    province("CA", "New Brunswick", "NB"),
    province("CA", "Newfoundland and Labrador", "NL"),
    province("CA", "Northwest Territories", "NT"),
    province("CA", "Nova Scotia", "NS"),
    province("CA", "Nunavut", "NU"),
    province("CA", "Ontario", "ON"),
    province("CA", "Prince Edward Island", "PE"),
    translated("CA", "Québec", "Quebec", "QC"),
    province("CA", "Saskatchewan", "SK"),
    province("CA", "Yukon", "YT"),
    // Mexico
    province("MX", "Aguascalientes", "AGU"),
    province("MX", "Baja California", "BCN"),
    province("MX", "Baja California Sur", "BCS"),
    province("MX", "Campeche", "CAM"),
    province("MX", "Chiapas", "CHP"),
    province("MX", "Chihuahua", "CHH"),
    translated("MX", "Ciudad de México", "Mexico City", "CMX"),
    province("MX", "Coahuila", "COA"),
    province("MX", "Colima", "COL"),
    province("MX", "Durango", "DUR"),
    translated("MX", "Estado de México", "Mexico", "MEX"),
    province("MX", "Guanajuato", "GUA"),
    province("MX", "Guerrero", "GRO"),
    province("MX", "Hidalgo", "HID"),
    province("MX", "Jalisco", "JAL"),
    translated("MX", "Michoacán", "Michoacan", "MIC"),
    province("MX", "Morelos", "MOR"),
    province("MX", "Nayarit", "NAY"),
    translated("MX", "Nuevo León", "Nuevo Leon", "NLE"),
    province("MX", "Oaxaca", "OAX"),
    province("MX", "Puebla", "PUE"),
    translated("MX", "Querétaro", "Queretaro", "QUE"),
    province("MX", "Quintana Roo", "ROO"),
    translated("MX", "San Luis Potosí", "San Luis Potosi", "SLP"),
    province("MX", "Sinaloa", "SIN"),
    province("MX", "Sonora", "SON"),
    province("MX", "Tabasco", "TAB"),
    province("MX", "Tamaulipas", "TAM"),
    province("MX", "Tlaxcala", "TLA"),
    province("MX", "Veracruz", "VER"),
    translated("MX", "Yucatán", "Yucatan", "YUC"),
    province("MX", "Zacatecas", "ZAC"),
];

/// Find the province whose match name equals `name_ascii` in `country`.
pub fn find_province(country: &str, name_ascii: &str) -> Option<&'static Province> {
    PROVINCES
        .iter()
        .find(|p| p.country == country && p.match_name() == name_ascii)
}
