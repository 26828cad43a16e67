fn main() {
    println!("cargo:rerun-if-changed=src/db/schemas");
    tauri_build::build();
}
