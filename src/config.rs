//! Command-line and environment configuration.

use clap::Args;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PASSWORD: &str = "idea123";
pub const DEFAULT_IMAGE: &str = "idea-docker-vnc-idea-user1";
pub const DEFAULT_NETWORK: &str = "idea-docker-vnc_default";
pub const DEFAULT_SHARED_VOLUME: &str = "idea-docker-vnc_shared-projects";
pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";

/// HTTP listener settings.
#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "API_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Password used when a create request carries none
    #[arg(long, env = "DEFAULT_PASSWORD", default_value = DEFAULT_PASSWORD)]
    pub default_password: String,
}

/// Container runtime settings.
#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    /// Container runtime CLI to invoke
    #[arg(long, env = "CONTAINER_RUNTIME", default_value = "docker")]
    pub runtime: String,

    /// Image for new user containers
    #[arg(long, env = "USER_IMAGE", default_value = DEFAULT_IMAGE)]
    pub image: String,

    /// Network user containers are attached to
    #[arg(long, default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// Volume shared by every user container
    #[arg(long, default_value = DEFAULT_SHARED_VOLUME)]
    pub shared_volume: String,

    /// Value of TZ inside user containers
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,
}

/// Naming conventions and fixed settings for user containers.
///
/// Every name is derived from the user id by concatenation: the container is
/// `{prefix}{id}` and the per-user volumes are `idea-{config,cache,local}-{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserLayout {
    pub prefix: String,
    pub image: String,
    pub network: String,
    pub shared_volume: String,
    pub timezone: String,
    pub shm_size: String,
    pub restart: String,
    pub home: String,
}

impl UserLayout {
    pub fn container_name(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// `(volume, mount target)` pairs in the order they are passed to `run`.
    pub fn volumes(&self, id: &str) -> Vec<(String, String)> {
        let mut volumes = vec![(self.shared_volume.clone(), format!("{}/projects", self.home))];
        for kind in ["config", "cache", "local"] {
            volumes.push((format!("idea-{}-{}", kind, id), format!("{}/.{}", self.home, kind)));
        }
        volumes
    }
}

impl Default for UserLayout {
    fn default() -> Self {
        Self {
            prefix: "idea-".to_string(),
            image: DEFAULT_IMAGE.to_string(),
            network: DEFAULT_NETWORK.to_string(),
            shared_volume: DEFAULT_SHARED_VOLUME.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            shm_size: "2gb".to_string(),
            restart: "unless-stopped".to_string(),
            home: "/home/developer".to_string(),
        }
    }
}

impl From<&RuntimeArgs> for UserLayout {
    fn from(args: &RuntimeArgs) -> Self {
        Self {
            image: args.image.clone(),
            network: args.network.clone(),
            shared_volume: args.shared_volume.clone(),
            timezone: args.timezone.clone(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_derived_from_user_id() {
        let layout = UserLayout::default();
        assert_eq!(layout.container_name("alice"), "idea-alice");
        assert_eq!(
            layout.volumes("alice"),
            vec![
                (
                    "idea-docker-vnc_shared-projects".to_string(),
                    "/home/developer/projects".to_string()
                ),
                ("idea-config-alice".to_string(), "/home/developer/.config".to_string()),
                ("idea-cache-alice".to_string(), "/home/developer/.cache".to_string()),
                ("idea-local-alice".to_string(), "/home/developer/.local".to_string()),
            ]
        );
    }
}
