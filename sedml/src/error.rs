// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostics: the error log populated while reading, and the result codes
//! returned by mutating operations.

use log::debug;

/// How serious a logged problem is.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Fatal => "Fatal",
        })
    }
}

macro_rules! error_codes {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident = $id:literal, $severity:ident, $short:literal;
        )*
    ) => {
        /// Identifies the kind of a logged problem.
        ///
        /// Discriminants are the numeric ids used by SED-ML tooling.
        #[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
        #[repr(u32)]
        pub enum SedErrorCode {
            $(
                $(#[$meta])*
                $variant = $id,
            )*
        }

        impl SedErrorCode {
            pub fn id(self) -> u32 {
                self as u32
            }

            pub fn severity(self) -> Severity {
                match self {
                    $(SedErrorCode::$variant => Severity::$severity,)*
                }
            }

            /// One-line description of the problem class.
            pub fn short_message(self) -> &'static str {
                match self {
                    $(SedErrorCode::$variant => $short,)*
                }
            }

            pub fn from_id(id: u32) -> Option<Self> {
                match id {
                    $($id => Some(SedErrorCode::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

error_codes! {
    XmlFileUnreadable = 2, Fatal, "File unreadable by XML parser";
    MissingXmlEncoding = 1002, Error, "Missing XML encoding attribute";
    BadXmlDecl = 1003, Error, "Invalid or missing XML declaration";
    BadlyFormedXml = 1006, Fatal, "Badly formed XML";
    BadXmlDeclLocation = 1023, Fatal, "XML declaration not permitted in this location";

    SedUnknown = 10000, Fatal, "Encountered unknown internal libSEDML error";
    SedNotUtf8 = 10001, Error, "File does not use UTF-8 encoding";
    SedUnrecognizedElement = 10002, Error, "Encountered unrecognized element";
    SedNotSchemaConformant = 10003, Error, "Document does not conform to the SED-ML XML schema";
    SedmlIdSyntaxRule = 10302, Error, "Invalid SId syntax";
    SedInvalidMetaidSyntax = 10303, Error, "Invalid syntax for a 'metaid' attribute value";
    SedMissingAnnotationNamespace = 10401, Error, "Missing declaration of the XML namespace for the annotation";
    SedDuplicateAnnotationNamespaces = 10402, Error, "Multiple annotations using the same XML namespace";
    SedNamespaceInAnnotation = 10403, Error, "The SED-ML XML namespace cannot be used in an Annotation object";
    SedMultipleAnnotations = 10404, Error, "Only one Annotation object is permitted under a given SED-ML object";
    SedAnnotationNotElement = 10405, Error, "The annotation must contain only elements";
    SedNotesNotInXhtmlNamespace = 10801, Error, "Notes must be placed in the XHTML XML namespace";
    SedNotesContainsXmlDecl = 10802, Error, "XML declarations are not permitted in Notes objects";
    SedNotesContainsDoctype = 10803, Error, "XML DOCTYPE elements are not permitted in Notes objects";
    SedInvalidNotesContent = 10804, Error, "Invalid notes content found";
    SedOnlyOneNotesElementAllowed = 10805, Error, "Only one Notes subobject is permitted on a given SED-ML object";

    InvalidNamespaceOnSed = 20101, Error, "Invalid namespace";
    SedAllowedAttributes = 20102, Error, "Allowed attributes";
    SedEmptyListElement = 20103, Error, "No empty listOf";
    SedmlDocumentAllowedCoreAttributes = 20201, Error, "Core attributes allowed on <document>";
    SedmlDocumentAllowedCoreElements = 20202, Error, "Core elements allowed on <document>";
    SedmlDocumentAllowedAttributes = 20203, Error, "Attributes allowed on <document>";
    SedmlDocumentAllowedElements = 20204, Error, "Elements allowed on <document>";
    SedmlDocumentLevelMustBeNonNegativeInteger = 20205, Error, "The 'level' attribute must be NonNegativeInteger";
    SedmlDocumentVersionMustBeNonNegativeInteger = 20206, Error, "The 'version' attribute must be NonNegativeInteger";
    SedmlDocumentLoModelsAllowedCoreAttributes = 20215, Error, "Core attributes allowed on <listOfModels>";
    SedmlDocumentLoSimulationsAllowedCoreAttributes = 20216, Error, "Core attributes allowed on <listOfSimulations>";
    SedmlDocumentLoTasksAllowedCoreAttributes = 20217, Error, "Core attributes allowed on <listOfTasks>";
    SedmlDocumentLoDataGeneratorsAllowedCoreAttributes = 20218, Error, "Core attributes allowed on <listOfDataGenerators>";
    SedmlDocumentLoOutputsAllowedCoreAttributes = 20219, Error, "Core attributes allowed on <listOfOutputs>";
    SedmlModelAllowedAttributes = 20303, Error, "Attributes allowed on <model>";
    SedmlModelLoChangesAllowedCoreAttributes = 20309, Error, "Core attributes allowed on <listOfChanges>";
    SedmlChangeAttributeAllowedAttributes = 20603, Error, "Attributes allowed on <changeAttribute>";
    SedmlVariableAllowedAttributes = 20703, Error, "Attributes allowed on <variable>";
    SedmlParameterAllowedAttributes = 20803, Error, "Attributes allowed on <parameter>";
    SedmlParameterValueMustBeDouble = 20804, Error, "The 'value' attribute must be Double";
    SedmlUniformTimeCourseAllowedAttributes = 21003, Error, "Attributes allowed on <uniformTimeCourse>";
    SedmlUniformTimeCourseInitialTimeMustBeDouble = 21004, Error, "The 'initialTime' attribute must be Double";
    SedmlUniformTimeCourseOutputStartTimeMustBeDouble = 21005, Error, "The 'outputStartTime' attribute must be Double";
    SedmlUniformTimeCourseOutputEndTimeMustBeDouble = 21006, Error, "The 'outputEndTime' attribute must be Double";
    SedmlUniformTimeCourseNumberOfPointsMustBeInteger = 21007, Error, "The 'numberOfPoints' attribute must be Integer";
    SedmlUniformTimeCourseNumberOfStepsMustBeInteger = 21008, Error, "The 'numberOfSteps' attribute must be Integer";
    SedmlAlgorithmAllowedAttributes = 21103, Error, "Attributes allowed on <algorithm>";
    SedmlTaskAllowedAttributes = 21303, Error, "Attributes allowed on <task>";
    SedmlDataGeneratorAllowedAttributes = 21403, Error, "Attributes allowed on <dataGenerator>";
    SedmlDataGeneratorLoVariablesAllowedCoreAttributes = 21408, Error, "Core attributes allowed on <listOfVariables>";
    SedmlDataGeneratorLoParametersAllowedCoreAttributes = 21409, Error, "Core attributes allowed on <listOfParameters>";
    SedmlOutputAllowedAttributes = 21503, Error, "Attributes allowed on <output>";
    SedmlDataSetAllowedAttributes = 22203, Error, "Attributes allowed on <dataSet>";
    SedmlReportLoDataSetsAllowedCoreAttributes = 22305, Error, "Core attributes allowed on <listOfDataSets>";

    SedUnknownCoreAttribute = 99994, Error, "Unknown attribute";
}

impl std::fmt::Display for SedErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.short_message(), self.id())
    }
}

impl SedErrorCode {
    /// True for low-level XML failures after which other diagnostics can't be trusted.
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            SedErrorCode::BadlyFormedXml | SedErrorCode::BadXmlDeclLocation
        )
    }
}

/// A single logged problem.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SedError {
    pub code: SedErrorCode,
    pub severity: Severity,
    pub level: u32,
    pub version: u32,
    pub message: String,

    /// 1-based line of the offending element, or 0 when not read from a document.
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: ({} [{}]) {}", self.line, self.code.id(), self.severity, self.code.short_message())?;
        if !self.message.is_empty() {
            write!(f, "\n {}", &self.message)?;
        }
        Ok(())
    }
}

/// Ordered collection of problems found in a document.
#[derive(Clone, Debug, Default)]
pub struct SedErrorLog {
    errors: Vec<SedError>,
}

impl SedErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. An empty `message` falls back to the code's short message.
    pub fn log(
        &mut self,
        code: SedErrorCode,
        level: u32,
        version: u32,
        message: &str,
        line: u32,
        column: u32,
    ) {
        let message = if message.is_empty() {
            code.short_message().to_owned()
        } else {
            message.to_owned()
        };
        debug!("logging {} at {}:{}: {}", code, line, column, &message);
        self.errors.push(SedError {
            code,
            severity: code.severity(),
            level,
            version,
            message,
            line,
            column,
        });
    }

    pub fn num_errors(&self) -> usize {
        self.errors.len()
    }

    pub fn error(&self, i: usize) -> Option<&SedError> {
        self.errors.get(i)
    }

    pub fn errors(&self) -> &[SedError] {
        &self.errors
    }

    pub fn contains(&self, code: SedErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn count(&self, code: SedErrorCode) -> usize {
        self.errors.iter().filter(|e| e.code == code).count()
    }

    /// Removes and returns the first entry with the given code.
    pub fn remove(&mut self, code: SedErrorCode) -> Option<SedError> {
        let i = self.errors.iter().position(|e| e.code == code)?;
        Some(self.errors.remove(i))
    }

    /// Drops every entry for which `keep` returns false.
    pub fn retain<F: FnMut(&SedError) -> bool>(&mut self, keep: F) {
        self.errors.retain(keep);
    }

    pub fn num_failures_with_severity(&self, severity: Severity) -> usize {
        self.errors.iter().filter(|e| e.severity == severity).count()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Re-logs every entry after `from` with code `old` as `new`, keeping its message and position.
    pub(crate) fn remap(&mut self, from: usize, old: SedErrorCode, new: SedErrorCode) {
        for e in self.errors.iter_mut().skip(from) {
            if e.code == old {
                debug!("remapping {} to {}", old, new);
                e.code = new;
                e.severity = new.severity();
            }
        }
    }
}

/// Failure of a mutating operation.
///
/// Discriminants are the integer result codes used by SED-ML tooling; success is 0.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[repr(i32)]
pub enum OperationError {
    IndexExceedsSize = -1,
    UnexpectedAttribute = -2,
    OperationFailed = -3,
    InvalidAttributeValue = -4,
    InvalidObject = -5,
    DuplicateObjectId = -6,
    LevelMismatch = -7,
    VersionMismatch = -8,
    InvalidXmlOperation = -9,
    NamespacesMismatch = -10,
    DuplicateAnnotationNs = -11,
    AnnotationNameNotFound = -12,
    AnnotationNsNotFound = -13,
    MissingMetaid = -14,
    DeprecatedAttribute = -15,
}

impl OperationError {
    pub fn code(self) -> i32 {
        self as i32
    }

    fn description(self) -> &'static str {
        match self {
            OperationError::IndexExceedsSize => "index exceeds size",
            OperationError::UnexpectedAttribute => "attribute not valid for this level/version or object",
            OperationError::OperationFailed => "operation failed",
            OperationError::InvalidAttributeValue => "invalid attribute value",
            OperationError::InvalidObject => "invalid object",
            OperationError::DuplicateObjectId => "duplicate object id",
            OperationError::LevelMismatch => "level mismatch",
            OperationError::VersionMismatch => "version mismatch",
            OperationError::InvalidXmlOperation => "invalid XML operation",
            OperationError::NamespacesMismatch => "namespaces mismatch",
            OperationError::DuplicateAnnotationNs => "duplicate annotation namespace",
            OperationError::AnnotationNameNotFound => "annotation name not found",
            OperationError::AnnotationNsNotFound => "annotation namespace not found",
            OperationError::MissingMetaid => "missing metaid",
            OperationError::DeprecatedAttribute => "deprecated attribute",
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

impl std::error::Error for OperationError {}

/// Result of a mutating operation.
pub type OpResult = Result<(), OperationError>;

/// Returns the integer code for `r`: 0 on success, otherwise the negative error code.
pub fn result_code(r: &OpResult) -> i32 {
    match r {
        Ok(()) => 0,
        Err(e) => e.code(),
    }
}

/// Construction of an element failed outright.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConstructorError(pub String);

impl std::fmt::Display for ConstructorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConstructorError {}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn log_and_remove() {
        let _ = env_logger::Builder::new().is_test(true).try_init();
        let mut log = SedErrorLog::new();
        log.log(SedErrorCode::SedUnknownCoreAttribute, 1, 4, "first", 3, 5);
        log.log(SedErrorCode::SedNotSchemaConformant, 1, 4, "", 0, 0);
        log.log(SedErrorCode::SedUnknownCoreAttribute, 1, 4, "second", 4, 1);
        assert_eq!(log.count(SedErrorCode::SedUnknownCoreAttribute), 2);
        assert_eq!(
            log.error(1).unwrap().message,
            SedErrorCode::SedNotSchemaConformant.short_message()
        );
        let removed = log.remove(SedErrorCode::SedUnknownCoreAttribute).unwrap();
        assert_eq!(removed.message, "first");
        assert_eq!(log.num_errors(), 2);
        assert_eq!(log.num_failures_with_severity(Severity::Error), 2);
        log.remap(0, SedErrorCode::SedUnknownCoreAttribute, SedErrorCode::SedmlModelAllowedAttributes);
        assert!(log.contains(SedErrorCode::SedmlModelAllowedAttributes));
        assert!(!log.contains(SedErrorCode::SedUnknownCoreAttribute));
    }

    #[test]
    fn codes() {
        assert_eq!(SedErrorCode::from_id(99994), Some(SedErrorCode::SedUnknownCoreAttribute));
        assert_matches!(SedErrorCode::from_id(1), None);
        assert_eq!(OperationError::DuplicateAnnotationNs.code(), -11);
        assert_eq!(result_code(&Ok(())), 0);
        assert_eq!(result_code(&Err(OperationError::UnexpectedAttribute)), -2);
        assert!(SedErrorCode::BadlyFormedXml.is_critical());
        assert!(!SedErrorCode::SedNotUtf8.is_critical());
    }
}
