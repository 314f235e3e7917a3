use std::fmt;
use std::str::FromStr;

use anyhow::{Error, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Home,
    Overview,
    Latest,
    ForecastOneHour,
    ForecastTwoHours,
    History,
    Report,
}

impl Page {
    /// Sidebar order.
    pub const ALL: [Page; 7] = [
        Page::Home,
        Page::Overview,
        Page::Latest,
        Page::ForecastOneHour,
        Page::ForecastTwoHours,
        Page::History,
        Page::Report,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home Page",
            Page::Overview => "Dashboard Utama",
            Page::Latest => "Data Terbaru",
            Page::ForecastOneHour => "Prediksi 1 Jam",
            Page::ForecastTwoHours => "Prediksi 2 Jam",
            Page::History => "History Temperature",
            Page::Report => "Statistik dan Laporan",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Overview => "dashboard",
            Page::Latest => "latest",
            Page::ForecastOneHour => "forecast-1h",
            Page::ForecastTwoHours => "forecast-2h",
            Page::History => "history",
            Page::Report => "report",
        }
    }

    pub fn path(&self) -> String {
        format!("/page/{}", self.slug())
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Page {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Page::ALL.into_iter().find(|p| p.slug() == s || p.title() == s) {
            Some(page) => Ok(page),
            None => bail!("unknown page: {}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slug_and_title() {
        assert_eq!("forecast-2h".parse::<Page>().unwrap(), Page::ForecastTwoHours);
        assert_eq!("Statistik dan Laporan".parse::<Page>().unwrap(), Page::Report);
        assert!("settings".parse::<Page>().is_err());
    }

    #[test]
    fn slugs_are_unique() {
        for (i, a) in Page::ALL.iter().enumerate() {
            for b in &Page::ALL[i + 1..] {
                assert_ne!(a.slug(), b.slug());
            }
        }
    }
}
