fn main() {
    uniffi::generate_scaffolding("src/duo.udl").unwrap();
}
