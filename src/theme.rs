pub mod catppuccin {
    use nu_ansi_term::Color;
    pub struct Mocha;
    impl Mocha {
        // Accents
        pub const RED: Color = Color::Rgb(243, 139, 168);
        pub const PEACH: Color = Color::Rgb(250, 179, 135);
        pub const MAUVE: Color = Color::Rgb(203, 166, 247);
        pub const SKY: Color = Color::Rgb(137, 220, 235);
    }
}
