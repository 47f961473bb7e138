use std::path::Path;

pub const DEFAULT_PARTICLE_COUNT: usize = 20;
pub const DEFAULT_SWITCH_DISTANCE: f32 = 30.0;
pub const DEFAULT_FRICTION: f32 = 0.97;
pub const DEFAULT_MAX_SPEED: f32 = 2.5;
pub const DEFAULT_CELL_SIZE: f32 = 120.0;
pub const DEFAULT_SPAWN_WIDTH: f32 = 800.0;
pub const DEFAULT_SPAWN_HEIGHT: f32 = 600.0;

/// Tunables for the particle field. Fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    /// Particles per population (primary and shadow each get this many).
    pub particle_count: usize,
    /// Distance below which a particle moves on to another band.
    pub switch_distance: f32,
    /// Per-step velocity multiplier.
    pub friction: f32,
    pub max_speed: f32,
    /// Spatial grid cell edge. Connections longer than this can be missed.
    pub cell_size: f32,
    pub spawn_width: f32,
    pub spawn_height: f32,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            switch_distance: DEFAULT_SWITCH_DISTANCE,
            friction: DEFAULT_FRICTION,
            max_speed: DEFAULT_MAX_SPEED,
            cell_size: DEFAULT_CELL_SIZE,
            spawn_width: DEFAULT_SPAWN_WIDTH,
            spawn_height: DEFAULT_SPAWN_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl FieldParams {
    /// Reads a params file. A missing file is not an error: defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ParamsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(ParamsError::Io(err.to_string())),
        };
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ParamsError> {
        let mut params = Self::default();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key_raw, value_raw)) = line.split_once('=') else {
                return Err(ParamsError::Parse {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            let key = key_raw.trim();
            let value = value_raw.trim();
            match key {
                "particle_count" => {
                    params.particle_count =
                        value.parse::<usize>().map_err(|_| ParamsError::Parse {
                            line: line_no,
                            message: format!("particle_count must be an integer, got '{value}'"),
                        })?;
                }
                "switch_distance" => params.switch_distance = parse_f32(value, line_no, key)?,
                "friction" => params.friction = parse_f32(value, line_no, key)?,
                "max_speed" => params.max_speed = parse_f32(value, line_no, key)?,
                "cell_size" => params.cell_size = parse_f32(value, line_no, key)?,
                "spawn_width" => params.spawn_width = parse_f32(value, line_no, key)?,
                "spawn_height" => params.spawn_height = parse_f32(value, line_no, key)?,
                other => {
                    return Err(ParamsError::Parse {
                        line: line_no,
                        message: format!("unknown key: {other}"),
                    });
                }
            }
        }
        params.validate()?;
        Ok(params)
    }

    pub fn to_text(&self) -> String {
        format!(
            "# band_field params v1\n\
             particle_count={}\n\
             switch_distance={}\n\
             friction={}\n\
             max_speed={}\n\
             cell_size={}\n\
             spawn_width={}\n\
             spawn_height={}\n",
            self.particle_count,
            self.switch_distance,
            self.friction,
            self.max_speed,
            self.cell_size,
            self.spawn_width,
            self.spawn_height,
        )
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.particle_count == 0 {
            return Err(ParamsError::InvalidValue {
                field: "particle_count",
                message: "must be at least 1".to_string(),
            });
        }
        if !self.friction.is_finite() || self.friction <= 0.0 || self.friction > 1.0 {
            return Err(ParamsError::InvalidValue {
                field: "friction",
                message: format!("must be in (0, 1], got {}", self.friction),
            });
        }
        if !self.switch_distance.is_finite() || self.switch_distance < 0.0 {
            return Err(ParamsError::InvalidValue {
                field: "switch_distance",
                message: format!("must be >= 0, got {}", self.switch_distance),
            });
        }
        for (field, v) in [
            ("max_speed", self.max_speed),
            ("cell_size", self.cell_size),
            ("spawn_width", self.spawn_width),
            ("spawn_height", self.spawn_height),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ParamsError::InvalidValue {
                    field,
                    message: format!("must be > 0, got {v}"),
                });
            }
        }
        Ok(())
    }
}

fn parse_f32(raw: &str, line: usize, key: &str) -> Result<f32, ParamsError> {
    let v = raw.parse::<f32>().map_err(|_| ParamsError::Parse {
        line,
        message: format!("{key} must be a number, got '{raw}'"),
    })?;
    if !v.is_finite() {
        return Err(ParamsError::Parse {
            line,
            message: format!("{key} must be finite"),
        });
    }
    Ok(v)
}
