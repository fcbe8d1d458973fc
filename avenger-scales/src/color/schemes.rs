//! Named color schemes. Colors are stored as packed six digit hex strings.

use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SchemeKind {
    Categorical,
    Sequential,
    Diverging,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SchemeData {
    /// Fixed list of colors
    Discrete(&'static str),
    /// Evenly spaced color stops interpolated in sRGB
    Ramp(&'static str),
    Turbo,
    Warm,
    Cool,
}

// Categorical
const CATEGORY10: &str = "1f77b4ff7f0e2ca02cd627289467bd8c564be377c27f7f7fbcbd2217becf";
const ACCENT: &str = "7fc97fbeaed4fdc086ffff99386cb0f0027fbf5b17666666";
const DARK2: &str = "1b9e77d95f027570b3e7298a66a61ee6ab02a6761d666666";
const PAIRED: &str = "a6cee31f78b4b2df8a33a02cfb9a99e31a1cfdbf6fff7f00cab2d66a3d9affff99b15928";
const PASTEL1: &str = "fbb4aeb3cde3ccebc5decbe4fed9a6ffffcce5d8bdfddaecf2f2f2";
const PASTEL2: &str = "b3e2cdfdcdaccbd5e8f4cae4e6f5c9fff2aef1e2cccccccc";
const SET1: &str = "e41a1c377eb84daf4a984ea3ff7f00ffff33a65628f781bf999999";
const SET2: &str = "66c2a5fc8d628da0cbe78ac3a6d854ffd92fe5c494b3b3b3";
const SET3: &str = "8dd3c7ffffb3bebadafb807280b1d3fdb462b3de69fccde5d9d9d9bc80bdccebc5ffed6f";
const TABLEAU10: &str = "4e79a7f28e2ce1575976b7b259a14fedc949af7aa1ff9da79c755fbab0ab";
const OBSERVABLE10: &str = "4269d0efb118ff725c6cc5b03ca951ff8ab7a463f297bbf59c6b4e9498a0";

// Sequential, single and multi hue
const BLUES: &str = "f7fbffdeebf7c6dbef9ecae16baed64292c62171b508519c08306b";
const GREENS: &str = "f7fcf5e5f5e0c7e9c0a1d99b74c47641ab5d238b45006d2c00441b";
const GREYS: &str = "fffffff0f0f0d9d9d9bdbdbd969696737373525252252525000000";
const ORANGES: &str = "fff5ebfee6cefdd0a2fdae6bfd8d3cf16913d94801a636037f2704";
const PURPLES: &str = "fcfbfdefedf5dadaebbcbddc9e9ac8807dba6a51a354278f3f007d";
const REDS: &str = "fff5f0fee0d2fcbba1fc9272fb6a4aef3b2ccb181da50f1567000d";
const BUGN: &str = "f7fcfde5f5f9ccece699d8c966c2a441ae76238b45006d2c00441b";
const BUPU: &str = "f7fcfde0ecf4bfd3e69ebcda8c96c68c6bb188419d810f7c4d004b";
const GNBU: &str = "f7fcf0e0f3dbccebc5a8ddb57bccc44eb3d32b8cbe0868ac084081";
const ORRD: &str = "fff7ecfee8c8fdd49efdbb84fc8d59ef6548d7301fb300007f0000";
const PUBU: &str = "fff7fbece7f2d0d1e6a6bddb74a9cf3690c00570b0045a8d023858";
const PUBUGN: &str = "fff7fbece2f0d0d1e6a6bddb67a9cf3690c002818a016c59014636";
const PURD: &str = "f7f4f9e7e1efd4b9dac994c7df65b0e7298ace125698004367001f";
const RDPU: &str = "fff7f3fde0ddfcc5c0fa9fb5f768a1dd3497ae017e7a017749006a";
const YLGN: &str = "ffffe5f7fcb9d9f0a3addd8e78c67941ab5d238443006837004529";
const YLGNBU: &str = "ffffd9edf8b1c7e9b47fcdbb41b6c41d91c0225ea8253494081d58";
const YLORBR: &str = "ffffe5fff7bcfee391fec44ffe9929ec7014cc4c02993404662506";
const YLORRD: &str = "ffffccffeda0fed976feb24cfd8d3cfc4e2ae31a1cbd0026800026";

// Sequential, perceptually uniform
const VIRIDIS: &str = concat!(
    "440154470e61481a6c482575472f7d443a834144873d4e8a39568c35608d31688e2d708e",
    "2a788e27818e23888e21918d1f988b1fa08822a8842ab07f35b77943bf7154c56866cc5d",
    "7ad1518fd744a5db36bcdf27d2e21be9e51afde725"
);
const MAGMA: &str = concat!(
    "0000040404130b0924150e3720114b2c11603b0f704a107957157e651a80721f817f24",
    "828c29819a2e80a8327db6377ac43c75d1426fde4968e95462f1605df76f5cfa7f5efc",
    "8f65fe9f6dfeaf78febf84fece91fddea0fcedaffcfdbf"
);
const INFERNO: &str = concat!(
    "0000040403130c0826170c3b240c4f330a5f420a68500d6c5d126e6b176e781c6d86",
    "216b932667a12b62ae305cbb3755c73e4cd24644dd513ae65c30ed6925f3771af8850f",
    "fb9506fca50afcb519fac62df6d645f2e661f3f484fcffa4"
);
const PLASMA: &str = concat!(
    "0d088723069033059742039d5002a25d01a66a00a87801a88405a7900da49c179ea721",
    "98b12a90ba3488c33d80cb4779d35171da5a69e16462e76e5bed7953f2834cf68f44fa",
    "9a3dfca636fdb32ffec029fcce25f9dc24f5ea27f0f921"
);
const CIVIDIS: &str = concat!(
    "00205100235800265d002961012b65042e670831690d346b11366c16396d1c3c6e213f6e",
    "26426e2c456e31476e374a6e3c4d6e42506e47536d4c566d51586e555b6e5a5e6e5e616e",
    "62646f66676f6a6a706e6d717270717573727976737c79747f7c75827f75868276898577",
    "8c8877908b78938e789691789a94789e9778a19b78a59e77a9a177aea575b2a874b6ab73",
    "bbaf71c0b26fc5b66dc9b96acebd68d3c065d8c462ddc85fe2cb5ce7cf58ebd355f0d652",
    "f3da4ff7de4cfae249fce647"
);

// Diverging
const BRBG: &str = "5430058c510abf812ddfc27df6e8c3f5f5f5c7eae580cdc135978f01665e003c30";
const PRGN: &str = "40004b762a839970abc2a5cfe7d4e8f7f7f7d9f0d3a6dba05aae611b783700441b";
const PIYG: &str = "8e0152c51b7dde77aef1b6dafde0eff7f7f7e6f5d0b8e1867fbc414d9221276419";
const PUOR: &str = "2d004b5427888073acb2abd2d8daebf7f7f7fee0b6fdb863e08214b358067f3b08";
const RDBU: &str = "67001fb2182bd6604df4a582fddbc7f7f7f7d1e5f092c5de4393c32166ac053061";
const RDGY: &str = "67001fb2182bd6604df4a582fddbc7ffffffe0e0e0bababa8787874d4d4d1a1a1a";
const RDYLBU: &str = "a50026d73027f46d43fdae61fee090ffffbfe0f3f8abd9e974add14575b4313695";
const RDYLGN: &str = "a50026d73027f46d43fdae61fee08bffffbfd9ef8ba6d96a66bd631a9850006837";
const SPECTRAL: &str = "9e0142d53e4ff46d43fdae61fee08bffffbfe6f598abdda466c2a53288bd5e4fa2";

/// Lowercase a scheme name and drop separators, so `"YlGnBu"`,
/// `"yl-gn-bu"` and `"ylgnbu"` name the same scheme
pub fn normalize_scheme_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

pub(crate) fn lookup_scheme(name: &str) -> Option<(SchemeKind, SchemeData)> {
    use SchemeData::*;
    use SchemeKind::*;
    let found = match normalize_scheme_name(name).as_str() {
        "category10" => (Categorical, Discrete(CATEGORY10)),
        "accent" => (Categorical, Discrete(ACCENT)),
        "dark2" => (Categorical, Discrete(DARK2)),
        "paired" => (Categorical, Discrete(PAIRED)),
        "pastel1" => (Categorical, Discrete(PASTEL1)),
        "pastel2" => (Categorical, Discrete(PASTEL2)),
        "set1" => (Categorical, Discrete(SET1)),
        "set2" => (Categorical, Discrete(SET2)),
        "set3" => (Categorical, Discrete(SET3)),
        "tableau10" => (Categorical, Discrete(TABLEAU10)),
        "observable10" => (Categorical, Discrete(OBSERVABLE10)),

        "blues" => (Sequential, Ramp(BLUES)),
        "greens" => (Sequential, Ramp(GREENS)),
        "greys" | "grays" => (Sequential, Ramp(GREYS)),
        "oranges" => (Sequential, Ramp(ORANGES)),
        "purples" => (Sequential, Ramp(PURPLES)),
        "reds" => (Sequential, Ramp(REDS)),
        "bugn" => (Sequential, Ramp(BUGN)),
        "bupu" => (Sequential, Ramp(BUPU)),
        "gnbu" => (Sequential, Ramp(GNBU)),
        "orrd" => (Sequential, Ramp(ORRD)),
        "pubu" => (Sequential, Ramp(PUBU)),
        "pubugn" => (Sequential, Ramp(PUBUGN)),
        "purd" => (Sequential, Ramp(PURD)),
        "rdpu" => (Sequential, Ramp(RDPU)),
        "ylgn" => (Sequential, Ramp(YLGN)),
        "ylgnbu" => (Sequential, Ramp(YLGNBU)),
        "ylorbr" => (Sequential, Ramp(YLORBR)),
        "ylorrd" => (Sequential, Ramp(YLORRD)),
        "viridis" => (Sequential, Ramp(VIRIDIS)),
        "magma" => (Sequential, Ramp(MAGMA)),
        "inferno" => (Sequential, Ramp(INFERNO)),
        "plasma" => (Sequential, Ramp(PLASMA)),
        "cividis" => (Sequential, Ramp(CIVIDIS)),
        "turbo" => (Sequential, Turbo),
        "warm" => (Sequential, Warm),
        "cool" => (Sequential, Cool),

        "brbg" => (Diverging, Ramp(BRBG)),
        "prgn" => (Diverging, Ramp(PRGN)),
        "piyg" => (Diverging, Ramp(PIYG)),
        "puor" => (Diverging, Ramp(PUOR)),
        "rdbu" => (Diverging, Ramp(RDBU)),
        "rdgy" => (Diverging, Ramp(RDGY)),
        "rdylbu" => (Diverging, Ramp(RDYLBU)),
        "rdylgn" => (Diverging, Ramp(RDYLGN)),
        "spectral" => (Diverging, Ramp(SPECTRAL)),
        _ => return None,
    };
    Some(found)
}

/// Kind of a built in scheme, or `None` if the name is unknown
pub fn scheme_kind(name: &str) -> Option<SchemeKind> {
    lookup_scheme(name).map(|(kind, _)| kind)
}

pub fn is_diverging_scheme(name: &str) -> bool {
    scheme_kind(name) == Some(SchemeKind::Diverging)
}

/// Split a packed hex string into `#rrggbb` strings
pub(crate) fn unpack(packed: &str) -> Vec<String> {
    packed
        .as_bytes()
        .chunks(6)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .map(|hex| format!("#{hex}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_names() {
        assert_eq!(normalize_scheme_name("YlGnBu"), "ylgnbu");
        assert_eq!(normalize_scheme_name("Rd-Yl_Bu"), "rdylbu");
    }

    #[test]
    fn test_lookup() {
        assert_eq!(scheme_kind("Tableau10"), Some(SchemeKind::Categorical));
        assert_eq!(scheme_kind("viridis"), Some(SchemeKind::Sequential));
        assert!(is_diverging_scheme("RdBu"));
        assert!(!is_diverging_scheme("blues"));
        assert_eq!(scheme_kind("not-a-scheme"), None);
    }

    #[test]
    fn test_packed_tables_are_whole_colors() {
        for packed in [
            CATEGORY10, ACCENT, DARK2, PAIRED, PASTEL1, PASTEL2, SET1, SET2, SET3, TABLEAU10,
            OBSERVABLE10, BLUES, GREENS, GREYS, ORANGES, PURPLES, REDS, BUGN, BUPU, GNBU, ORRD,
            PUBU, PUBUGN, PURD, RDPU, YLGN, YLGNBU, YLORBR, YLORRD, VIRIDIS, MAGMA, INFERNO,
            PLASMA, CIVIDIS, BRBG, PRGN, PIYG, PUOR, RDBU, RDGY, RDYLBU, RDYLGN, SPECTRAL,
        ] {
            assert_eq!(packed.len() % 6, 0, "{packed}");
            assert!(packed.chars().all(|c| c.is_ascii_hexdigit()));
        }
        assert_eq!(unpack(CATEGORY10).len(), 10);
        assert_eq!(unpack(CATEGORY10)[0], "#1f77b4");
        assert_eq!(unpack(RDBU).len(), 11);
    }
}
