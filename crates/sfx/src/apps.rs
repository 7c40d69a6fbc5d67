use crate::client::ClusterClient;
use crate::prelude::{println, *};

use sfx_core::explorer::{ApplicationInfo, ServiceInfo};

/// Options for listing applications
#[derive(Debug, clap::Args, Clone)]
pub struct AppsOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Options for listing the services of one application
#[derive(Debug, clap::Args, Clone)]
pub struct ServicesOptions {
    /// Application id (e.g., "VotingApp" for fabric:/VotingApp)
    pub application_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn format_applications_table(apps: &[ApplicationInfo]) -> String {
    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row![
        "Name", "Type", "Version", "Status", "Health"
    ]);

    for app in apps {
        table.add_row(prettytable::row![
            &app.name,
            app.type_name.as_deref().unwrap_or("-"),
            app.type_version.as_deref().unwrap_or("-"),
            app.status.as_deref().unwrap_or("-"),
            app.health_state.as_deref().unwrap_or("-")
        ]);
    }

    table.to_string()
}

pub fn format_services_table(services: &[ServiceInfo]) -> String {
    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row![
        "Name", "Kind", "Type", "Status", "Health"
    ]);

    for service in services {
        table.add_row(prettytable::row![
            &service.name,
            service.service_kind.as_deref().unwrap_or("-"),
            service.type_name.as_deref().unwrap_or("-"),
            service.service_status.as_deref().unwrap_or("-"),
            service.health_state.as_deref().unwrap_or("-")
        ]);
    }

    table.to_string()
}

/// Handle the apps command
pub async fn handler(client: &ClusterClient, options: AppsOptions) -> Result<()> {
    let apps = client.list_applications().await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&apps)?);
    } else {
        println!("Found {} application(s):\n", apps.len());
        if !apps.is_empty() {
            println!("{}", format_applications_table(&apps));
        }
    }

    Ok(())
}

/// Handle the services command
pub async fn services_handler(client: &ClusterClient, options: ServicesOptions) -> Result<()> {
    let services = client.list_services(&options.application_id).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&services)?);
    } else {
        println!(
            "Found {} service(s) in {}:\n",
            services.len(),
            options.application_id
        );
        if !services.is_empty() {
            println!("{}", format_services_table(&services));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_applications_table() {
        let apps = vec![ApplicationInfo {
            id: "VotingApp".to_string(),
            name: "fabric:/VotingApp".to_string(),
            type_name: Some("VotingType".to_string()),
            type_version: Some("1.0.0".to_string()),
            status: Some("Ready".to_string()),
            health_state: None,
        }];

        let table = format_applications_table(&apps);

        assert!(table.contains("fabric:/VotingApp"));
        assert!(table.contains("VotingType"));
        assert!(table.contains("Ready"));
    }

    #[test]
    fn test_format_services_table() {
        let services = vec![ServiceInfo {
            id: "VotingApp~VotingWeb".to_string(),
            name: "fabric:/VotingApp/VotingWeb".to_string(),
            type_name: Some("VotingWebType".to_string()),
            manifest_version: Some("1.0.0".to_string()),
            service_kind: Some("Stateless".to_string()),
            service_status: Some("Active".to_string()),
            health_state: Some("Ok".to_string()),
        }];

        let table = format_services_table(&services);

        assert!(table.contains("fabric:/VotingApp/VotingWeb"));
        assert!(table.contains("Stateless"));
    }
}
