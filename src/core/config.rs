use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub minio: MinIOConfig,
    pub email: EmailConfig,
    pub company: CompanyConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// MinIO/S3 storage configuration for generated report documents
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Public endpoint URL for publicly accessible files (optional, defaults to endpoint)
    pub public_endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing files
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Prefix for public files (e.g., "public")
    pub public_prefix: String,
    /// Folder below the public prefix that holds rendered reports
    pub reports_folder: String,
}

/// Transactional email (Resend) configuration
///
/// When `api_key` is absent, emails are logged instead of sent.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub from: String,
}

/// Letterhead and signing authority printed on every report
#[derive(Debug, Clone)]
pub struct CompanyConfig {
    pub name: String,
    pub tagline: String,
    pub signer: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub city: String,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Per-image download timeout while rendering
    pub image_fetch_timeout: Duration,
    /// Longest edge (px) an embedded photo is downscaled to
    pub max_image_edge_px: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            minio: MinIOConfig::from_env()?,
            email: EmailConfig::from_env()?,
            company: CompanyConfig::from_env()?,
            report: ReportConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60; // 1 minute

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET environment variable is required".to_string())?;

        if jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters".to_string());
        }

        let jwt_leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        Ok(Self {
            jwt_secret,
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Condo Reports API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Weekly maintenance photo reports for condominium administration".to_string()
        });

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint =
            env::var("MINIO_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "condo-maintenance".to_string());

        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let public_prefix =
            env::var("MINIO_PUBLIC_PREFIX").unwrap_or_else(|_| "public".to_string());

        let reports_folder = env::var("MINIO_REPORTS_FOLDER")
            .unwrap_or_else(|_| "maintenance/reports".to_string())
            .trim_matches('/')
            .to_string();

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            public_endpoint: public_endpoint.trim_end_matches('/').to_string(),
            access_key,
            secret_key,
            bucket,
            region,
            public_prefix,
            reports_folder,
        })
    }
}

impl EmailConfig {
    pub fn from_env() -> Result<Self, String> {
        let api_key = env::var("RESEND_API_KEY").ok().filter(|s| !s.is_empty());
        let api_url = env::var("RESEND_API_URL")
            .unwrap_or_else(|_| "https://api.resend.com/emails".to_string());
        let from = env::var("EMAIL_FROM")
            .unwrap_or_else(|_| "Grupo Ingcor <noreply@grupoingcor.com>".to_string());

        Ok(Self {
            api_key,
            api_url,
            from,
        })
    }
}

impl CompanyConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            name: env::var("COMPANY_NAME").unwrap_or_else(|_| "Grupo Ingcor".to_string()),
            tagline: env::var("COMPANY_TAGLINE")
                .unwrap_or_else(|_| "Ingeniería en Construcción y Remodelación".to_string()),
            signer: env::var("COMPANY_SIGNER")
                .unwrap_or_else(|_| "Ing. José María Salgado Ruiz".to_string()),
            address: env::var("COMPANY_ADDRESS").unwrap_or_else(|_| {
                "Costera M. Alemán 101 Fracc. Las Playas, Acapulco Guerrero".to_string()
            }),
            phone: env::var("COMPANY_PHONE").unwrap_or_else(|_| "Móvil 744 4149689".to_string()),
            email: env::var("COMPANY_EMAIL")
                .unwrap_or_else(|_| "josemariasr45@gmail.com".to_string()),
            city: env::var("COMPANY_CITY").unwrap_or_else(|_| "Acapulco Guerrero".to_string()),
        })
    }
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            name: "Grupo Ingcor".to_string(),
            tagline: "Ingeniería en Construcción y Remodelación".to_string(),
            signer: "Ing. José María Salgado Ruiz".to_string(),
            address: "Costera M. Alemán 101 Fracc. Las Playas, Acapulco Guerrero".to_string(),
            phone: "Móvil 744 4149689".to_string(),
            email: "josemariasr45@gmail.com".to_string(),
            city: "Acapulco Guerrero".to_string(),
        }
    }
}

impl ReportConfig {
    const DEFAULT_IMAGE_FETCH_TIMEOUT_SECS: u64 = 20;
    const DEFAULT_MAX_IMAGE_EDGE_PX: u32 = 1600;

    pub fn from_env() -> Result<Self, String> {
        let timeout_secs = env::var("REPORT_IMAGE_FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IMAGE_FETCH_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "REPORT_IMAGE_FETCH_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_image_edge_px = env::var("REPORT_MAX_IMAGE_EDGE_PX")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_IMAGE_EDGE_PX.to_string())
            .parse::<u32>()
            .map_err(|_| "REPORT_MAX_IMAGE_EDGE_PX must be a valid number".to_string())?;

        Ok(Self {
            image_fetch_timeout: Duration::from_secs(timeout_secs),
            max_image_edge_px: max_image_edge_px.max(64),
        })
    }
}
