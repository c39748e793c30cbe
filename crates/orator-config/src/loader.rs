use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error on out-of-range limits, timeouts or speed bounds
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_dispatch()?;
        self.validate_engines()?;
        Ok(())
    }

    fn validate_dispatch(&self) -> anyhow::Result<()> {
        let dispatch = &self.dispatch;

        if dispatch.max_concurrent == 0 {
            anyhow::bail!("dispatch.max_concurrent must be at least 1");
        }

        if !(dispatch.smoothing > 0.0 && dispatch.smoothing <= 1.0) {
            anyhow::bail!("dispatch.smoothing must be in (0, 1]");
        }

        if !(dispatch.safety_factor.is_finite() && dispatch.safety_factor > 0.0) {
            anyhow::bail!("dispatch.safety_factor must be a positive number");
        }

        let positive = [
            ("default_timeout_seconds", dispatch.default_timeout_seconds),
            ("default_hard_timeout_seconds", dispatch.default_hard_timeout_seconds),
            ("timeout_floor_seconds", dispatch.timeout_floor_seconds),
            ("min_timeout_seconds", dispatch.min_timeout_seconds),
            ("warmup_timeout_seconds", dispatch.warmup_timeout_seconds),
            ("min_speed", dispatch.min_speed),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                anyhow::bail!("dispatch.{name} must be a positive number");
            }
        }

        if !(dispatch.default_dedupe_seconds.is_finite() && dispatch.default_dedupe_seconds >= 0.0) {
            anyhow::bail!("dispatch.default_dedupe_seconds must not be negative");
        }

        if !dispatch.max_speed.is_finite() || dispatch.max_speed < dispatch.min_speed {
            anyhow::bail!("dispatch.max_speed must be at least dispatch.min_speed");
        }

        Ok(())
    }

    fn validate_engines(&self) -> anyhow::Result<()> {
        let rate = &self.engines.rate;

        if rate.base_wpm == 0 || rate.min_wpm == 0 {
            anyhow::bail!("engines.rate words-per-minute values must be positive");
        }

        if rate.min_wpm > rate.max_wpm {
            anyhow::bail!("engines.rate.min_wpm must not exceed engines.rate.max_wpm");
        }

        for (name, command) in [("say", &self.engines.say.command), ("espeak", &self.engines.espeak.command)] {
            if command.as_deref().is_some_and(|c| c.trim().is_empty()) {
                anyhow::bail!("engines.{name}.command must not be empty");
            }
        }

        Ok(())
    }
}
