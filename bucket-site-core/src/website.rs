//! Region handling and the public URL of a bucket's website endpoint.

/// Region assumed when a store reports no location constraint.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Regions whose website endpoint uses the older `s3-website-<region>` form.
const DASH_ENDPOINT_REGIONS: &[&str] = &[
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "eu-west-1",
    "sa-east-1",
    "us-gov-west-1",
];

/// Map a raw bucket location constraint to a region name.
///
/// S3 reports buckets in us-east-1 with an empty constraint and old eu-west-1
/// buckets as `EU`.
pub fn normalise_region(location: Option<&str>) -> String {
    match location.map(str::trim) {
        None | Some("") => DEFAULT_REGION.to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

/// Host name of the static website endpoint for `region`.
pub fn website_endpoint(region: &str) -> String {
    let domain = if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    };
    if DASH_ENDPOINT_REGIONS.contains(&region) {
        format!("s3-website-{region}.{domain}")
    } else {
        format!("s3-website.{region}.{domain}")
    }
}

/// Public URL of the website hosted from `bucket` in `region`.
pub fn bucket_url(bucket: &str, region: &str) -> String {
    format!("http://{}.{}", bucket, website_endpoint(region))
}
