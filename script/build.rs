fn main() {
    #[cfg(feature = "sp1")]
    {
        sp1_build::build_program("../programs/deposit");
        sp1_build::build_program("../programs/spend");
    }
}
