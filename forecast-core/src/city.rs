use std::{convert::TryFrom, fmt, str::FromStr};

/// Cities of the Volgograd region the dashboard can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum City {
    #[default]
    Volgograd,
    Volzhsky,
    Kamyshin,
    Mikhaylovka,
    Uryupinsk,
    Frolovo,
    KalachNaDonu,
    Kotovo,
    Gorodishche,
    Surovikino,
}

impl City {
    /// Display name, as shown to the user.
    pub fn as_str(&self) -> &'static str {
        match self {
            City::Volgograd => "Волгоград",
            City::Volzhsky => "Волжский",
            City::Kamyshin => "Камышин",
            City::Mikhaylovka => "Михайловка",
            City::Uryupinsk => "Урюпинск",
            City::Frolovo => "Фролово",
            City::KalachNaDonu => "Калач-на-Дону",
            City::Kotovo => "Котово",
            City::Gorodishche => "Городище",
            City::Surovikino => "Суровикино",
        }
    }

    /// Name the weather provider resolves.
    pub fn provider_query(&self) -> &'static str {
        match self {
            City::Volgograd => "Volgograd",
            City::Volzhsky => "Volzhskiy",
            City::Kamyshin => "Kamyshin",
            City::Mikhaylovka => "Mikhaylovka",
            City::Uryupinsk => "Uryupinsk",
            City::Frolovo => "Frolovo",
            City::KalachNaDonu => "Kalach-na-Donu",
            City::Kotovo => "Kotovo",
            City::Gorodishche => "Gorodishche",
            City::Surovikino => "Surovikino",
        }
    }

    pub const fn all() -> &'static [City] {
        &[
            City::Volgograd,
            City::Volzhsky,
            City::Kamyshin,
            City::Mikhaylovka,
            City::Uryupinsk,
            City::Frolovo,
            City::KalachNaDonu,
            City::Kotovo,
            City::Gorodishche,
            City::Surovikino,
        ]
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for City {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let wanted = value.trim().to_lowercase();

        City::all()
            .iter()
            .copied()
            .find(|city| {
                city.as_str().to_lowercase() == wanted
                    || city.provider_query().to_lowercase() == wanted
            })
            .ok_or_else(|| {
                let names: Vec<&str> = City::all().iter().map(City::as_str).collect();
                anyhow::anyhow!("Unknown city '{value}'. Supported cities: {}.", names.join(", "))
            })
    }
}

impl FromStr for City {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        City::try_from(s)
    }
}

/// Translate a display name into the provider's query.
///
/// Names outside the table are passed through unchanged, so the provider gets
/// a chance to resolve them itself.
pub fn provider_query(name: &str) -> &str {
    City::all()
        .iter()
        .find(|city| city.as_str() == name)
        .map(|city| city.provider_query())
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_roundtrip() {
        for city in City::all() {
            let parsed = City::try_from(city.as_str()).expect("roundtrip should succeed");
            assert_eq!(*city, parsed);
        }
    }

    #[test]
    fn parses_provider_name_case_insensitive() {
        assert_eq!("kalach-na-donu".parse::<City>().unwrap(), City::KalachNaDonu);
        assert_eq!(" ВОЛЖСКИЙ ".parse::<City>().unwrap(), City::Volzhsky);
    }

    #[test]
    fn unknown_city_error_lists_supported() {
        let err = City::try_from("Москва").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Unknown city"));
        assert!(msg.contains("Волгоград"));
    }

    #[test]
    fn provider_query_translates_known_names() {
        assert_eq!(provider_query("Волгоград"), "Volgograd");
        assert_eq!(provider_query("Городище"), "Gorodishche");
    }

    #[test]
    fn provider_query_passes_unknown_through() {
        assert_eq!(provider_query("Saratov"), "Saratov");
    }

    #[test]
    fn default_city_is_volgograd() {
        assert_eq!(City::default(), City::Volgograd);
    }
}
