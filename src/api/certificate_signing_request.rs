use k8s_openapi::api::certificates::v1::CertificateSigningRequest;

/// Label tying a registration CSR to the cluster that raised it.
pub static CSR_CLUSTER_LABEL: &str = "open-cluster-management.io/cluster-name";

pub fn csrs_for_cluster<'a>(
    cluster_name: &str,
    csrs: &'a [CertificateSigningRequest],
) -> Vec<&'a CertificateSigningRequest> {
    csrs.iter()
        .filter(|csr| {
            csr.metadata
                .labels
                .as_ref()
                .and_then(|labels| labels.get(CSR_CLUSTER_LABEL))
                .is_some_and(|name| name == cluster_name)
        })
        .collect()
}

/// Most recently created request wins; registration retries leave a trail of
/// older CSRs behind.
pub fn latest_csr<'a>(
    csrs: &[&'a CertificateSigningRequest],
) -> Option<&'a CertificateSigningRequest> {
    csrs.iter()
        .max_by_key(|csr| csr.metadata.creation_timestamp.as_ref())
        .copied()
}

pub fn certificate_issued(csr: &CertificateSigningRequest) -> bool {
    csr.status
        .as_ref()
        .and_then(|status| status.certificate.as_ref())
        .is_some()
}
