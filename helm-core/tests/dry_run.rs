//! Dry-run flows through the public API: nothing is spawned, commands are echoed

use helm_core::{
    runner_for, uninstall, Component, Installer, KubectlSettings, Runner, RunnerKind,
};

fn print_runner() -> Box<dyn Runner> {
    // A program that cannot exist: any attempt to spawn it would fail
    let settings = KubectlSettings {
        program: "/nonexistent/helm-dry-run/kubectl".to_string(),
        context: None,
    };
    let runner = runner_for(true, &settings);
    assert_eq!(runner.kind(), RunnerKind::Print);
    runner
}

#[test]
fn install_dry_run_uses_default_images() {
    let runner = print_runner();
    let out = Installer::new().install(runner.as_ref()).unwrap();

    assert!(out.starts_with("[CMD] /nonexistent/helm-dry-run/kubectl create -f -"));
    assert!(out.contains("gcr.io/kubernetes-helm/manager:latest"));
    assert!(out.contains("gcr.io/kubernetes-helm/resourcifier:latest"));
    assert!(out.contains("gcr.io/kubernetes-helm/expandybird:latest"));
}

#[test]
fn install_dry_run_with_override() {
    let runner = print_runner();
    let mut installer = Installer::new();
    installer.set_image(Component::Expandybird, "registry.local/expandybird:dev");

    let out = installer.install(runner.as_ref()).unwrap();
    assert!(out.contains("registry.local/expandybird:dev"));
    assert!(!out.contains("gcr.io/kubernetes-helm/expandybird:latest"));
    assert!(out.contains("gcr.io/kubernetes-helm/manager:latest"));
}

#[test]
fn uninstall_dry_run_echoes_delete() {
    let runner = print_runner();
    let out = uninstall(runner.as_ref()).unwrap();
    assert_eq!(out, "[CMD] /nonexistent/helm-dry-run/kubectl delete namespace dm");
}

#[test]
fn status_and_target_dry_run() {
    let runner = print_runner();

    let out = runner.get_by_kind("pods", "", "dm").unwrap();
    assert_eq!(
        String::from_utf8_lossy(&out),
        "[CMD] /nonexistent/helm-dry-run/kubectl get pods --all-namespaces -l dm"
    );

    let out = runner.cluster_info().unwrap();
    assert_eq!(
        String::from_utf8_lossy(&out),
        "[CMD] /nonexistent/helm-dry-run/kubectl cluster-info"
    );
}
