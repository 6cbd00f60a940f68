use insta::assert_snapshot;
use kiabom_test_utils::sandbox::Sandbox;

const BOARD_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<export version="E">
  <design>
    <source>/projects/demo/demo.kicad_sch</source>
    <date>2024-05-01T10:00:00+0100</date>
    <tool>Eeschema 8.0.2</tool>
  </design>
  <components>
    <comp ref="R2">
      <value>10k</value>
      <footprint>Resistor_SMD:R_0603_1608Metric</footprint>
      <datasheet>~</datasheet>
      <description>Resistor</description>
      <fields>
        <field name="MPN">RC0603FR-0710KL</field>
      </fields>
    </comp>
    <comp ref="C1">
      <value>100nF</value>
      <footprint>Capacitor_SMD:C_0402_1005Metric</footprint>
      <description>Capacitor</description>
      <fields>
        <field name="MPN">GRM155R71C104KA88D</field>
        <field name="Voltage">16V</field>
      </fields>
    </comp>
    <comp ref="R1">
      <value>10k</value>
      <footprint>Resistor_SMD:R_0603_1608Metric</footprint>
      <description>Resistor</description>
      <fields>
        <field name="MPN">RC0603FR-0710KL</field>
      </fields>
    </comp>
    <comp ref="R3">
      <value>1k</value>
      <footprint>Resistor_SMD:R_0603_1608Metric</footprint>
      <description>Resistor</description>
      <fields>
        <field name="MPN">TBD</field>
      </fields>
      <property name="dnp"/>
    </comp>
    <comp ref="TP1">
      <value>TP</value>
      <footprint>TestPoint:TestPoint_Pad_D1.0mm</footprint>
      <property name="exclude_from_bom"/>
    </comp>
    <comp ref="#PWR01">
      <value>GND</value>
    </comp>
  </components>
</export>
"##;

fn sandbox() -> Sandbox {
    let mut sb = Sandbox::new();
    sb.write("board.xml", BOARD_XML);
    sb
}

fn read_csv(sb: &Sandbox, rel: &str) -> String {
    let text = sb.read(rel);
    text.strip_prefix('\u{feff}')
        .expect("CSV starts with a byte order mark")
        .to_string()
}

#[test]
fn test_offline_csv_with_dnp_section() {
    let sb = sandbox();
    sb.run(
        "kiabom",
        ["board.xml", "bom.csv", "-k", "--columns-preset", "no-suppliers"],
        None,
    )
    .unwrap();

    assert_snapshot!(read_csv(&sb, "bom.csv"), @r#"
    "Group ID","Quantity","Schematic Ref","DNP","Description","Footprint","Value"
    "1","1","C1","","Capacitor","C_0402_1005Metric","100nF"
    "2","2","R1,R2","","Resistor","R_0603_1608Metric","10k"
    "DNP1","1","R3","DNP","Resistor","R_0603_1608Metric","1k"
    "#);
}

#[test]
fn test_board_quantity_and_custom_columns() {
    let sb = sandbox();
    sb.run(
        "kiabom",
        [
            "board.xml",
            "bom.csv",
            "-k",
            "--no-headers",
            "-b",
            "3",
            "-c",
            "Designator,Quantity,Comment,Voltage",
        ],
        None,
    )
    .unwrap();

    assert_snapshot!(read_csv(&sb, "bom.csv"), @r#"
    "C1","3","100nF","16V"
    "R1,R2","6","10k",""
    "R3","3","1k",""
    "#);
}

#[test]
fn test_dnp_output_and_keep_flags() {
    let sb = sandbox();
    sb.run(
        "kiabom",
        [
            "board.xml",
            "bom.csv",
            "-k",
            "--kefbom",
            "-c",
            "Designator,DNP",
            "--dnp-output",
            "dnp.csv",
        ],
        None,
    )
    .unwrap();

    assert_snapshot!(read_csv(&sb, "bom.csv"), @r#"
    "Designator","DNP"
    "C1",""
    "R1,R2",""
    "TP1",""
    "#);
    assert_snapshot!(read_csv(&sb, "dnp.csv"), @r#"
    "Designator","DNP"
    "R3","DNP"
    "#);
}

#[test]
fn test_remove_ignored_mpn_parts() {
    let sb = sandbox();
    sb.run(
        "kiabom",
        [
            "board.xml",
            "bom.csv",
            "-k",
            "--keep-dnp",
            "--remove-ignore-mpn-parts",
            "--ignore-mpns",
            "GRM155R71C104KA88D",
            "-c",
            "Designator",
        ],
        None,
    )
    .unwrap();

    assert_snapshot!(read_csv(&sb, "bom.csv"), @r#"
    "Designator"
    "R1,R2"
    "#);
}

#[test]
fn test_info_and_sum_rows() {
    let sb = sandbox();
    sb.run(
        "kiabom",
        ["board.xml", "bom.csv", "-k", "--info", "--sum", "-c", "Designator,Total Price"],
        None,
    )
    .unwrap();

    let csv = read_csv(&sb, "bom.csv");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], r#""Board Quantity:","1""#);
    assert_eq!(lines[1], r#""Schematic:","/projects/demo/demo.kicad_sch""#);
    assert_eq!(lines[2], r#""Component Count:","4""#);
    assert_eq!(lines[3], r#""Schematic Date:","2024-05-01T10:00:00+0100""#);
    assert!(lines[4].starts_with(r#""Date:","#));
    assert!(lines[5].starts_with(r#""Generator:","KiABOM "#));
    assert_eq!(lines[6], r#""Designator","Total Price""#);
    assert_eq!(lines.last().copied(), Some(r#""Total Price Sum:","0.00""#));
}

#[test]
fn test_html_and_txt_outputs() {
    let sb = sandbox();
    sb.run("kiabom", ["board.xml", "bom.HTML", "-k", "-c", "Designator,Value"], None)
        .unwrap();
    let html = sb.read("bom.HTML");
    assert!(html.contains("<th>Designator</th><th>Value</th>"));
    assert!(html.contains("<td>R1,R2</td><td>10k</td>"));

    sb.run("kiabom", ["board.xml", "bom.txt", "-k", "-c", "Designator,Value"], None)
        .unwrap();
    let txt = sb.read("bom.txt");
    assert!(txt.contains("R1,R2"));
    assert!(txt.contains("Designator"));
}

#[test]
fn test_list_presets() {
    let sb = sandbox();
    let stdout = sb
        .run("kiabom", ["--list-group-presets"], None)
        .unwrap();
    assert_snapshot!(stdout, @r"
    Available group presets are:

    custom:

    default:
    	Value
    	Footprint
    	DNP
    	MPN

    jlcpcb:
    	Value
    	Footprint

    mage:
    	Value
    	Footprint
    	MPN
    	DNP
    	Rating

    minimal:
    	Value
    	Footprint
    ");
}

#[test]
fn test_user_config_presets_are_listed() {
    let mut sb = sandbox();
    sb.write_user_config("[presets.columns]\nboard = [\"Designator\", \"MPN\"]\n");
    let stdout = sb
        .run("kiabom", ["--list-column-presets"], None)
        .unwrap();
    assert!(stdout.contains("board:\n\tDesignator\n\tMPN\n"));

    sb.run(
        "kiabom",
        ["board.xml", "bom.csv", "-k", "--columns-preset", "board", "--no-headers"],
        None,
    )
    .unwrap();
    assert_snapshot!(read_csv(&sb, "bom.csv"), @r#"
    "C1","GRM155R71C104KA88D"
    "R1,R2","RC0603FR-0710KL"
    "R3","TBD"
    "#);
}

#[test]
fn test_unknown_column_is_fatal() {
    let sb = sandbox();
    let output = sb.output("kiabom", ["board.xml", "bom.csv", "-k", "-c", "Colour"], None);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(stderr.contains("Colour"), "{stderr}");
    assert!(!sb.root_path().join("bom.csv").exists());
}

#[test]
fn test_configuration_errors() {
    let sb = sandbox();

    let output = sb.output("kiabom", ["board.xml", "bom.xlsx", "-k"], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not supported"));

    let output = sb.output("kiabom", ["board.xml", "bom.csv", "-k", "--currency", "JPY"], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("JPY"));

    let output = sb.output(
        "kiabom",
        ["board.xml", "bom.csv", "-k", "--group-preset", "fancy"],
        None,
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--list-group-presets"));

    let output = sb.output("kiabom", ["board.xml", "bom.csv", "-k", "-g", "MPN"], None);
    assert_eq!(output.status.code(), Some(1));

    // Rejected by the argument parser.
    let output = sb.output("kiabom", ["board.xml", "bom.csv", "-k", "-b", "0"], None);
    assert_ne!(output.status.code(), Some(0));
}

#[test]
fn test_missing_credentials_fall_back_to_offline() {
    let sb = sandbox();
    let output = sb.output(
        "kiabom",
        ["board.xml", "bom.csv", "-c", "Designator,Order Code"],
        None,
    );
    assert_eq!(
        output.status.code(),
        Some(0),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_snapshot!(read_csv(&sb, "bom.csv"), @r#"
    "Designator","Order Code"
    "C1",""
    "R1,R2",""
    "R3",""
    "#);
}

#[test]
fn test_datasheet_failure_is_only_a_warning() {
    let mut sb = Sandbox::new();
    sb.write(
        "board.xml",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<export version="E">
  <components>
    <comp ref="U1">
      <value>LM358</value>
      <footprint>Package_SO:SOIC-8</footprint>
      <datasheet>https://example.com/ds/lm358.pdf</datasheet>
    </comp>
  </components>
</export>
"#,
    );
    // A file where the datasheet directory should go.
    sb.write("datasheets", "");

    let output = sb.output(
        "kiabom",
        ["board.xml", "bom.csv", "-k", "-d", "-c", "Designator"],
        None,
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "{stderr}");
    assert!(stderr.contains("Warning:"), "{stderr}");
    assert_snapshot!(read_csv(&sb, "bom.csv"), @r#"
    "Designator"
    "U1"
    "#);
}
