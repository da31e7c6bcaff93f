fn main() {
    // migrations are embedded via sqlx::migrate!
    println!("cargo:rerun-if-changed=migrations");
}
