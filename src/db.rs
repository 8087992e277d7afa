//! Database management commands for a local PostgreSQL instance.
//!
//! Everything here shells out to the PostgreSQL administration tools
//! (`psql`, `createdb`, `pg_dump`) as the `postgres` system user and
//! judges success by exit status alone. Nothing is transactional: a
//! failure partway leaves earlier steps in place, and the commands are
//! meant to be re-run, each step skipping work that already exists.

use crate::errors::BootstrapError;
use std::path::Path;
use std::process::Command;
use tracing::info;
use url::Url;

const EXTENSION: &str = "uuid-ossp";
const LOOPBACK_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// Splits a PostgreSQL connection URI into its parts.
pub fn explode_db_uri(db_uri: &str) -> Result<ConnectionInfo, BootstrapError> {
    let parsed = Url::parse(db_uri)
        .map_err(|err| BootstrapError::Configuration(format!("invalid database URI: {err}")))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| BootstrapError::Configuration("database URI has no host".to_string()))?
        .to_string();

    let database = parsed.path().trim_start_matches('/').to_string();
    if database.is_empty() {
        return Err(BootstrapError::Configuration(
            "database URI has no database name".to_string(),
        ));
    }

    let username = parsed.username().to_string();
    if username.is_empty() {
        return Err(BootstrapError::Configuration(
            "database URI has no username".to_string(),
        ));
    }

    Ok(ConnectionInfo {
        host,
        database,
        username,
        password: parsed.password().unwrap_or_default().to_string(),
    })
}

/// Seam for the administrative subprocess calls, so tests can script
/// exit codes and captured output instead of touching a real cluster.
pub trait CommandRunner {
    /// Runs a command and reports whether it exited successfully.
    fn status(&self, program: &str, args: &[&str]) -> std::io::Result<bool>;
    /// Runs a command and returns its captured stdout.
    fn output(&self, program: &str, args: &[&str]) -> std::io::Result<String>;
}

impl<R: CommandRunner> CommandRunner for &R {
    fn status(&self, program: &str, args: &[&str]) -> std::io::Result<bool> {
        (**self).status(program, args)
    }

    fn output(&self, program: &str, args: &[&str]) -> std::io::Result<String> {
        (**self).output(program, args)
    }
}

/// Runs commands on the real system.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn status(&self, program: &str, args: &[&str]) -> std::io::Result<bool> {
        Ok(Command::new(program).args(args).status()?.success())
    }

    fn output(&self, program: &str, args: &[&str]) -> std::io::Result<String> {
        let output = Command::new(program).args(args).output()?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub struct Bootstrapper<R = SystemRunner> {
    runner: R,
}

impl Bootstrapper<SystemRunner> {
    pub fn new() -> Self {
        Self {
            runner: SystemRunner,
        }
    }
}

impl Default for Bootstrapper<SystemRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> Bootstrapper<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    /// Prepares a local PostgreSQL instance from the given connection
    /// URI: creates the role and the database if they are missing and
    /// installs the uuid-ossp extension. Refuses to configure anything
    /// that is not on localhost.
    pub fn init_postgres(&self, db_uri: &str) -> Result<(), BootstrapError> {
        let conn = explode_db_uri(db_uri)?;
        if !LOOPBACK_HOSTS.contains(&conn.host.as_str()) {
            return Err(BootstrapError::Configuration(format!(
                "cannot configure a remote database (host is {})",
                conn.host
            )));
        }

        self.ensure_role(&conn)?;
        self.ensure_database(&conn)?;
        self.ensure_extension(&conn)?;
        Ok(())
    }

    fn ensure_role(&self, conn: &ConnectionInfo) -> Result<(), BootstrapError> {
        let count_query = format!(
            "SELECT COUNT(*) FROM pg_user WHERE usename = '{}';",
            conn.username
        );
        let count = self
            .runner
            .output("sudo", &["-u", "postgres", "psql", "-t", "-A", "-c", &count_query])?;

        // psql -t -A prints the bare count; '0' as the first character
        // means the role is absent.
        if count.starts_with('0') {
            info!(username = %conn.username, "creating database role");
            let create_role = format!(
                "CREATE ROLE {} PASSWORD '{}' NOSUPERUSER NOCREATEDB NOCREATEROLE INHERIT LOGIN;",
                conn.username, conn.password
            );
            let created = self
                .runner
                .status("sudo", &["-u", "postgres", "psql", "-c", &create_role])?;
            if !created {
                return Err(BootstrapError::Provisioning {
                    step: "create PostgreSQL user",
                });
            }
        }
        Ok(())
    }

    fn ensure_database(&self, conn: &ConnectionInfo) -> Result<(), BootstrapError> {
        // A no-op connection is the reachability probe.
        let reachable = self
            .runner
            .status("sudo", &["-u", "postgres", "psql", "-c", "\\q", &conn.database])?;

        if !reachable {
            info!(database = %conn.database, owner = %conn.username, "creating database");
            let created = self.runner.status(
                "sudo",
                &["-u", "postgres", "createdb", "-O", &conn.username, &conn.database],
            )?;
            if !created {
                return Err(BootstrapError::Provisioning {
                    step: "create PostgreSQL database",
                });
            }
        }
        Ok(())
    }

    fn ensure_extension(&self, conn: &ConnectionInfo) -> Result<(), BootstrapError> {
        let create_extension = format!("CREATE EXTENSION IF NOT EXISTS \"{EXTENSION}\";");
        let installed = self.runner.status(
            "sudo",
            &["-u", "postgres", "psql", "-t", "-A", "-c", &create_extension, &conn.database],
        )?;
        if !installed {
            return Err(BootstrapError::Provisioning {
                step: "create PostgreSQL extension",
            });
        }
        Ok(())
    }

    /// Applies the schema definition file to the target database.
    pub fn create_tables(&self, db_uri: &str, schema: &Path) -> Result<(), BootstrapError> {
        self.run_sql_file(db_uri, schema, "create database tables")
    }

    /// Installs the fixture records from the given SQL file.
    pub fn install_fixtures(&self, db_uri: &str, fixtures: &Path) -> Result<(), BootstrapError> {
        self.run_sql_file(db_uri, fixtures, "install database fixtures")
    }

    /// Dumps the target database in pg_dump custom format.
    pub fn backup(&self, db_uri: &str, out_file: &Path) -> Result<(), BootstrapError> {
        let conn = explode_db_uri(db_uri)?;
        let out_file = out_file.display().to_string();
        info!(database = %conn.database, out_file = %out_file, "dumping database");
        let dumped = self.runner.status(
            "sudo",
            &["-u", "postgres", "pg_dump", "-Fc", "-f", &out_file, &conn.database],
        )?;
        if !dumped {
            return Err(BootstrapError::Provisioning {
                step: "back up PostgreSQL database",
            });
        }
        Ok(())
    }

    fn run_sql_file(
        &self,
        db_uri: &str,
        file: &Path,
        step: &'static str,
    ) -> Result<(), BootstrapError> {
        let conn = explode_db_uri(db_uri)?;
        let file = file.display().to_string();
        info!(database = %conn.database, file = %file, "applying SQL file");
        let applied = self.runner.status(
            "sudo",
            &["-u", "postgres", "psql", "-d", &conn.database, "-f", &file],
        )?;
        if !applied {
            return Err(BootstrapError::Provisioning { step });
        }
        Ok(())
    }
}
