use time::macros::format_description;

fn main() {
    let now = time::OffsetDateTime::now_utc();
    let date_fmt = format_description!("[month repr:short] [day padding:space] [year]");
    let time_fmt = format_description!("[hour]:[minute]:[second]");

    let date = std::env::var("PLOG_BUILD_DATE")
        .unwrap_or_else(|_| now.format(date_fmt).unwrap_or_else(|_| "unknown".to_string()));
    let time = std::env::var("PLOG_BUILD_TIME")
        .unwrap_or_else(|_| now.format(time_fmt).unwrap_or_else(|_| "unknown".to_string()));

    println!("cargo:rustc-env=PLOG_BUILD_DATE={}", date);
    println!("cargo:rustc-env=PLOG_BUILD_TIME={}", time);
    println!("cargo:rerun-if-env-changed=PLOG_BUILD_DATE");
    println!("cargo:rerun-if-env-changed=PLOG_BUILD_TIME");
}
