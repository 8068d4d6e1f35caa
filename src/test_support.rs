//! Fixtures shared by unit tests.

use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

const OPF_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>Il diavolo</dc:title>
    <dc:creator opf:role="aut" opf:file-as="Papini, Giovanni">Giovanni Papini</dc:creator>
    <dc:identifier id="BookId" opf:scheme="UUID">urn:uuid:1234</dc:identifier>
    <dc:language>it</dc:language>
    <dc:subject>Fiction</dc:subject>
    <dc:subject>Classics</dc:subject>
    <meta name="cover" content="cover-image"/>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="chapter1" href="chapter1.xhtml" media-type="application/xhtml+xml"/>
    <item id="chapter2" href="chapter2.xhtml" media-type="application/xhtml+xml"/>
    <!-- no href -->
    <item id="broken" media-type="text/css"/>
    <item id="chapter3" href="chapter3.xhtml" media-type="application/xhtml+xml"/>
    <item id="cover-image" href="images/cover.png" media-type="image/png"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="chapter1"/>
    <itemref idref="chapter2"/>
    <itemref idref="chapter3" linear="no"/>
  </spine>
"#;

const OPF_GUIDE: &str = r#"  <guide>
    <reference type="cover" title="Cover" href="chapter1.xhtml"/>
    <reference type="text" title="Start" href="chapter2.xhtml"/>
  </guide>
"#;

const OPF_TAIL: &str = "</package>\n";

pub fn sample_opf() -> String {
    format!("{OPF_HEAD}{OPF_GUIDE}{OPF_TAIL}")
}

pub fn sample_opf_without_guide() -> String {
    format!("{OPF_HEAD}{OPF_TAIL}")
}

pub fn sample_ncx() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="urn:uuid:1234"/>
    <meta name="dtb:depth" content="2"/>
  </head>
  <docTitle>
    <text>Il diavolo</text>
  </docTitle>
  <navMap>
    <navPoint id="np-1" playOrder="1">
      <navLabel><text>Chapter 1</text></navLabel>
      <content src="chapter1.xhtml"/>
      <navPoint id="np-2" playOrder="2">
        <navLabel><text>Section 1.1</text></navLabel>
        <content src="chapter1.xhtml#s1"/>
      </navPoint>
    </navPoint>
    <navPoint id="np-3" playOrder="3">
      <navLabel><text>Chapter 2</text></navLabel>
      <content src="chapter2.xhtml"/>
    </navPoint>
    <navPoint playOrder="4">
      <navLabel><text></text></navLabel>
      <content src="chapter3.xhtml"/>
    </navPoint>
  </navMap>
</ncx>
"#
    .to_string()
}

pub fn chapter(title: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<html xmlns=\"http://www.w3.org/1999/xhtml\"><head><title>{title}</title></head><body><h1>{title}</h1></body></html>\n"
    )
}

/// PNG signature plus a few bytes; enough to be stored as binary.
const COVER_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Zip `members` in order. `mimetype` and images are stored, the rest deflated.
pub fn build_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in members {
        let method = if *name == "mimetype" || name.ends_with(".png") {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default().compression_method(method);
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn epub_with(opf: &str) -> Vec<u8> {
    let ncx = sample_ncx();
    let chapters = [chapter("Chapter 1"), chapter("Chapter 2"), chapter("Chapter 3")];
    build_archive(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ("OEBPS/content.opf", opf.as_bytes()),
        ("OEBPS/toc.ncx", ncx.as_bytes()),
        ("OEBPS/chapter1.xhtml", chapters[0].as_bytes()),
        ("OEBPS/chapter2.xhtml", chapters[1].as_bytes()),
        ("OEBPS/chapter3.xhtml", chapters[2].as_bytes()),
        ("OEBPS/images/cover.png", COVER_PNG),
    ])
}

/// A complete EPUB 2 book built from the sample package and navigation.
pub fn sample_epub() -> Vec<u8> {
    epub_with(&sample_opf())
}

pub fn sample_epub_without_guide() -> Vec<u8> {
    epub_with(&sample_opf_without_guide())
}
