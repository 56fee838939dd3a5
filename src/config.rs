use clap::Parser;

use crate::models::SportId;

/// Multi-sport live scoreboard daemon
#[derive(Parser, Debug, Clone)]
#[command(name = "scorehub", version, about)]
pub struct Config {
    /// Sport to activate at startup (nfl | bundesliga)
    #[arg(long, env = "SPORT", default_value = "nfl")]
    pub sport: String,

    /// Comma-separated allow-list restricting the plugin listing
    /// (all registered sports when unset)
    #[arg(long, env = "ENABLED_SPORTS")]
    pub enabled_sports: Option<String>,

    /// Scoreboard polling interval in seconds
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "10")]
    pub poll_interval_secs: u64,

    /// ESPN site API base URL for the NFL plugin
    #[arg(
        long,
        env = "NFL_API_URL",
        default_value = "https://site.api.espn.com/apis/site/v2/sports/football/nfl"
    )]
    pub nfl_api_url: String,

    /// OpenLigaDB base URL for the Bundesliga plugin
    #[arg(long, env = "OPENLIGADB_API_URL", default_value = "https://api.openligadb.de")]
    pub openligadb_api_url: String,

    /// OpenLigaDB league shortcut (bl1 = Bundesliga, bl2 = 2. Bundesliga)
    #[arg(long, env = "BUNDESLIGA_LEAGUE", default_value = "bl1")]
    pub bundesliga_league: String,

    /// Season used for the league table, e.g. 2025
    #[arg(long, env = "SEASON", default_value = "2025")]
    pub season: String,

    /// Live-table refresh interval in seconds (sports with standings only)
    #[arg(long, env = "TABLE_REFRESH_SECS", default_value = "60")]
    pub table_refresh_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.initial_sport()?;
        self.enabled()?;
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be positive");
        }
        if self.table_refresh_secs == 0 {
            anyhow::bail!("table_refresh_secs must be positive");
        }
        if self.season.is_empty() || !self.season.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("season must be a year, e.g. 2025");
        }
        Ok(())
    }

    pub fn initial_sport(&self) -> anyhow::Result<SportId> {
        self.sport
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{} (set --sport or SPORT)", e))
    }

    /// Parsed allow-list; `None` means every registered sport is enabled
    pub fn enabled(&self) -> anyhow::Result<Option<Vec<SportId>>> {
        match &self.enabled_sports {
            None => Ok(None),
            Some(raw) => {
                let ids = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| s.parse::<SportId>().map_err(|e| anyhow::anyhow!(e)))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                Ok(Some(ids))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config::parse_from(["scorehub"])
    }

    #[test]
    fn defaults_validate() {
        let config = base_config();
        config.validate().unwrap();
        assert_eq!(config.initial_sport().unwrap(), SportId::Nfl);
        assert_eq!(config.enabled().unwrap(), None);
    }

    #[test]
    fn rejects_unknown_sport() {
        let mut config = base_config();
        config.sport = "cricket".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_intervals_and_bad_seasons() {
        let mut config = base_config();
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.season = "24/25".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_the_allow_list() {
        let mut config = base_config();
        config.enabled_sports = Some("bundesliga, nfl".into());
        let enabled = config.enabled().unwrap().unwrap();
        assert_eq!(enabled, vec![SportId::Bundesliga, SportId::Nfl]);
    }
}
