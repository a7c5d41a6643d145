//! Kubernetes manifests for the DM workload
//!
//! Renders one multi-document YAML stream: the `dm` namespace, then a Service
//! and a Deployment per component. Every object carries the `dm` label so
//! `kubectl get pods -l dm` selects the whole workload.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dm::Component;
use crate::error::{DmError, Result};

/// Namespace the workload is installed into
pub const DM_NAMESPACE: &str = "dm";

/// Label key shared by every DM object
pub const DM_LABEL: &str = "dm";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Resource<S: Serialize> {
    api_version: &'static str,
    kind: &'static str,
    metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    spec: Option<S>,
}

#[derive(Debug, Default, Serialize)]
struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct ServiceSpec {
    ports: Vec<ServicePort>,
    selector: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServicePort {
    port: u16,
    target_port: u16,
    protocol: &'static str,
}

#[derive(Debug, Serialize)]
struct DeploymentSpec {
    replicas: u32,
    selector: LabelSelector,
    template: PodTemplate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LabelSelector {
    match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct PodTemplate {
    metadata: Metadata,
    spec: PodSpec,
}

#[derive(Debug, Serialize)]
struct PodSpec {
    containers: Vec<Container>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Container {
    name: String,
    image: String,
    image_pull_policy: &'static str,
    ports: Vec<ContainerPort>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContainerPort {
    container_port: u16,
}

fn component_labels(component: Component) -> BTreeMap<String, String> {
    BTreeMap::from([(DM_LABEL.to_string(), component.name().to_string())])
}

fn namespace() -> Resource<()> {
    Resource {
        api_version: "v1",
        kind: "Namespace",
        metadata: Metadata {
            name: Some(DM_NAMESPACE.to_string()),
            labels: BTreeMap::from([(DM_LABEL.to_string(), DM_NAMESPACE.to_string())]),
            ..Default::default()
        },
        spec: None,
    }
}

fn service(component: Component) -> Resource<ServiceSpec> {
    Resource {
        api_version: "v1",
        kind: "Service",
        metadata: Metadata {
            name: Some(format!("{}-service", component.name())),
            namespace: Some(DM_NAMESPACE.to_string()),
            labels: component_labels(component),
        },
        spec: Some(ServiceSpec {
            ports: vec![ServicePort {
                port: component.port(),
                target_port: component.port(),
                protocol: "TCP",
            }],
            selector: component_labels(component),
        }),
    }
}

fn deployment(component: Component, image: &str) -> Resource<DeploymentSpec> {
    Resource {
        api_version: "apps/v1",
        kind: "Deployment",
        metadata: Metadata {
            name: Some(component.name().to_string()),
            namespace: Some(DM_NAMESPACE.to_string()),
            labels: component_labels(component),
        },
        spec: Some(DeploymentSpec {
            replicas: 1,
            selector: LabelSelector {
                match_labels: component_labels(component),
            },
            template: PodTemplate {
                metadata: Metadata {
                    labels: component_labels(component),
                    ..Default::default()
                },
                spec: PodSpec {
                    containers: vec![Container {
                        name: component.name().to_string(),
                        image: image.to_string(),
                        image_pull_policy: "Always",
                        ports: vec![ContainerPort {
                            container_port: component.port(),
                        }],
                    }],
                },
            },
        }),
    }
}

fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).map_err(|e| DmError::manifest(e.to_string()))
}

/// Render the full install manifest for the given component images
pub fn render(images: &[(Component, String)]) -> Result<String> {
    let mut docs = vec![to_yaml(&namespace())?];
    for (component, image) in images {
        docs.push(to_yaml(&service(*component))?);
        docs.push(to_yaml(&deployment(*component, image))?);
    }
    Ok(docs.join("---\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<(Component, String)> {
        vec![
            (Component::Expandybird, "example.com/expandybird:v1".to_string()),
            (Component::Resourcifier, "example.com/resourcifier:v1".to_string()),
            (Component::Manager, "example.com/manager:v1".to_string()),
        ]
    }

    #[test]
    fn test_render_document_count() {
        let manifest = render(&sample()).unwrap();
        // namespace + (service, deployment) per component
        assert_eq!(manifest.matches("---\n").count(), 6);
        assert!(manifest.starts_with("apiVersion: v1\nkind: Namespace\n"));
    }

    #[test]
    fn test_render_is_valid_yaml_stream() {
        let manifest = render(&sample()).unwrap();
        let docs: Vec<serde_yaml::Value> = manifest
            .split("---\n")
            .map(|doc| serde_yaml::from_str(doc).unwrap())
            .collect();

        assert_eq!(docs.len(), 7);
        let manager = &docs[6];
        assert_eq!(manager["kind"].as_str(), Some("Deployment"));
        assert_eq!(manager["metadata"]["namespace"].as_str(), Some(DM_NAMESPACE));
        assert_eq!(
            manager["spec"]["template"]["spec"]["containers"][0]["image"].as_str(),
            Some("example.com/manager:v1")
        );
        assert_eq!(
            manager["spec"]["template"]["spec"]["containers"][0]["ports"][0]["containerPort"]
                .as_u64(),
            Some(8080)
        );
    }

    #[test]
    fn test_every_object_labelled() {
        let manifest = render(&sample()).unwrap();
        for doc in manifest.split("---\n") {
            let value: serde_yaml::Value = serde_yaml::from_str(doc).unwrap();
            assert!(
                value["metadata"]["labels"].get(DM_LABEL).is_some(),
                "missing dm label in {doc}"
            );
        }
    }
}
