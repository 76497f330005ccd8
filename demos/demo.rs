/* demos/demo.rs */

use client_info::{
    ConnectionInfo, Enricher, HeaderMap, IpExtractor, IpSource, normalize, resolve_client_ip,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Client Info Examples ===\n");

    // Example 1: X-Client-IP beats every other source
    example_1_x_client_ip();

    // Example 2: X-Forwarded-For with unknown hops and ports
    example_2_x_forwarded_for();

    // Example 3: Fallback through the connection tiers
    example_3_connection_fallback();

    // Example 4: IPv4-mapped IPv6 normalization
    example_4_normalization();

    // Example 5: Full enrichment with a user agent
    example_5_enrich();

    // Example 6: Custom source order
    example_6_custom_sources();

    println!("=== All examples completed! ===");
}

fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn example_1_x_client_ip() {
    println!("Example 1: X-Client-IP header");

    let headers = headers(&[
        ("x-client-ip", "198.51.100.7"),
        ("x-forwarded-for", "203.0.113.1"),
        ("x-real-ip", "192.0.2.5"),
    ]);

    match resolve_client_ip(&headers, None) {
        Some(ip) => println!("Extracted IP: {}", ip),
        None => println!("No IP found"),
    }
    println!();
}

fn example_2_x_forwarded_for() {
    println!("Example 2: X-Forwarded-For with unknown hops");

    let headers = headers(&[("x-forwarded-for", "unknown, 203.0.113.1:8080, 10.0.0.5")]);

    match IpExtractor::new().resolve(&headers, None) {
        Some(resolved) => println!("Extracted IP {} from {}", resolved.ip, resolved.source),
        None => println!("No IP found"),
    }
    println!();
}

fn example_3_connection_fallback() {
    println!("Example 3: Connection fallback");

    let connection = ConnectionInfo::new()
        .with_remote_address("unknown")
        .with_socket_remote_address("10.0.0.6");

    match IpExtractor::new().resolve(&HeaderMap::new(), Some(&connection)) {
        Some(resolved) => println!("Extracted IP {} from {}", resolved.ip, resolved.source),
        None => println!("No IP found"),
    }

    match resolve_client_ip(&HeaderMap::new(), None) {
        Some(ip) => println!("Extracted IP: {}", ip),
        None => println!("No IP found without headers or connection"),
    }
    println!();
}

fn example_4_normalization() {
    println!("Example 4: Normalization");

    for ip in ["::ffff:192.168.1.1", "2001:0db8:0000:0000:0000:0000:0000:0001", "10.0.0.1"] {
        println!("{} -> {}", ip, normalize(ip));
    }
    println!();
}

fn example_5_enrich() {
    println!("Example 5: Full enrichment");

    let headers = headers(&[
        ("x-forwarded-for", "::ffff:203.0.113.9"),
        (
            "user-agent",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        ),
    ]);

    let info = Enricher::default().enrich(&headers, None);
    println!("IP:      {:?}", info.ip);
    println!("Browser: {} {}", info.agent.browser.name, info.agent.browser.version);
    println!("OS:      {} {}", info.agent.os.name, info.agent.os.version);
    println!("Device:  {}", info.agent.device.name);
    println!();
}

fn example_6_custom_sources() {
    println!("Example 6: Custom source order");

    let headers = headers(&[("x-client-ip", "198.51.100.7"), ("cf-connecting-ip", "192.0.2.44")]);

    // Only trust Cloudflare, then the socket.
    let extractor =
        IpExtractor::new().with_sources(vec![IpSource::CfConnectingIp, IpSource::ConnectionRemote]);
    match extractor.extract(&headers, None) {
        Some(ip) => println!("Extracted IP (Cloudflare only): {}", ip),
        None => println!("No IP found"),
    }
    println!();
}
