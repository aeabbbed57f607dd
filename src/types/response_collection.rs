use std::ops::Index;
use std::slice::Iter;

use log::debug;

use super::{ResponseHandler, ServiceResponse, ServiceResult};
use crate::error::Result;
use crate::xml::{EwsXmlReader, XmlNamespace};

/// The per-item responses to one batched request, together with their worst outcome.
#[derive(Clone, Debug)]
pub struct ServiceResponseCollection<T> {
    responses: Vec<T>,
    overall_result: ServiceResult,
}

impl<T> Default for ServiceResponseCollection<T> {
    fn default() -> Self {
        ServiceResponseCollection {
            responses: Vec::new(),
            overall_result: ServiceResult::Success,
        }
    }
}

impl<T: AsRef<ServiceResponse>> ServiceResponseCollection<T> {
    pub fn new() -> Self {
        ServiceResponseCollection::default()
    }

    /// Appends a response. The overall result becomes the more severe of the two.
    pub fn add(&mut self, response: T) {
        self.overall_result = self.overall_result.max(response.as_ref().result());
        self.responses.push(response);
    }

    /// `Error` if any response is an error, else `Warning` if any is a warning, else `Success`.
    pub fn overall_result(&self) -> ServiceResult {
        self.overall_result
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.responses.get(index)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.responses.iter()
    }
}

impl<T: AsRef<ServiceResponse>> FromIterator<T> for ServiceResponseCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = ServiceResponseCollection::new();
        for response in iter {
            collection.add(response);
        }
        collection
    }
}

impl<T> Index<usize> for ServiceResponseCollection<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.responses[index]
    }
}

impl<T> IntoIterator for ServiceResponseCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ServiceResponseCollection<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.iter()
    }
}

/// A response envelope together with the handler that read it.
#[derive(Clone, Debug)]
pub struct HandledResponse<H> {
    pub response: ServiceResponse,
    pub handler: H,
}

impl<H> AsRef<ServiceResponse> for HandledResponse<H> {
    fn as_ref(&self) -> &ServiceResponse {
        &self.response
    }
}

impl<H: ResponseHandler> ServiceResponseCollection<HandledResponse<H>> {
    /// Reads a `m:ResponseMessages` block.
    ///
    /// Each child named `response_element_name` is read with a fresh handler from
    /// `new_handler`, which is given the child's position. Other children are skipped. The cursor
    /// may be on `ResponseMessages` or just before it, and is left on its end element.
    pub fn load_from_xml<F>(
        reader: &mut EwsXmlReader<'_>,
        response_element_name: &str,
        mut new_handler: F,
    ) -> Result<Self>
    where
        F: FnMut(usize) -> H,
    {
        if !reader.is_start_element_named(XmlNamespace::Messages, "ResponseMessages") {
            reader.read_start_element(XmlNamespace::Messages, "ResponseMessages")?;
        }

        let mut collection = ServiceResponseCollection::new();
        loop {
            reader.read()?;
            if reader.is_end_element_named(XmlNamespace::Messages, "ResponseMessages") {
                break;
            }
            if reader.is_start_element_named(XmlNamespace::Messages, response_element_name) {
                let mut handler = new_handler(collection.len());
                let response = ServiceResponse::load_from_xml_with_handler(
                    reader,
                    response_element_name,
                    &mut handler,
                )?;
                collection.add(HandledResponse { response, handler });
            } else if reader.is_start_element() {
                debug!("skipping unexpected {} in ResponseMessages", reader.local_name());
                reader.skip_current_element()?;
            }
        }

        debug!(
            "read {} {} element(s), overall {}",
            collection.len(),
            response_element_name,
            collection.overall_result()
        );
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceError;

    fn response(result: ServiceResult) -> ServiceResponse {
        ServiceResponse::new(result, ServiceError::NoError, None)
    }

    // Error if any member is Error, else Warning if any is Warning, else Success
    fn worst(members: &[ServiceResult]) -> ServiceResult {
        if members.contains(&ServiceResult::Error) {
            ServiceResult::Error
        } else if members.contains(&ServiceResult::Warning) {
            ServiceResult::Warning
        } else {
            ServiceResult::Success
        }
    }

    #[test]
    fn overall_result_over_all_sequences() {
        use ServiceResult::*;

        let results = [Success, Warning, Error];
        let mut sequences = 0;
        for &a in &results {
            for &b in &results {
                for &c in &results {
                    let order = [a, b, c];
                    let mut collection = ServiceResponseCollection::new();
                    for (i, &r) in order.iter().enumerate() {
                        collection.add(response(r));
                        assert_eq!(
                            collection.overall_result(),
                            worst(&order[..=i]),
                            "prefix {:?}",
                            &order[..=i]
                        );
                    }
                    assert_eq!(collection.len(), 3);
                    sequences += 1;
                }
            }
        }
        assert_eq!(sequences, 27);
    }

    #[test]
    fn empty_collection_is_success() {
        let collection = ServiceResponseCollection::<ServiceResponse>::new();
        assert!(collection.is_empty());
        assert_eq!(collection.overall_result(), ServiceResult::Success);
    }

    #[test]
    fn keeps_insertion_order() {
        let mut collection = ServiceResponseCollection::new();
        collection.add(response(ServiceResult::Error));
        collection.add(response(ServiceResult::Success));
        assert_eq!(collection[0].result(), ServiceResult::Error);
        assert_eq!(
            collection.get(1).map(ServiceResponse::result),
            Some(ServiceResult::Success)
        );
        assert!(collection.get(2).is_none());
        assert_eq!(collection.overall_result(), ServiceResult::Error);
    }

    #[test]
    fn reads_response_messages() {
        let xml = r#"<m:ResponseMessages xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages">
            <m:DeleteItemResponseMessage ResponseClass="Success">
                <m:ResponseCode>NoError</m:ResponseCode>
            </m:DeleteItemResponseMessage>
            <m:Unexpected><m:DeleteItemResponseMessage ResponseClass="Error"/></m:Unexpected>
            <m:DeleteItemResponseMessage ResponseClass="Error">
                <m:MessageText>Not found.</m:MessageText>
                <m:ResponseCode>ErrorItemNotFound</m:ResponseCode>
                <m:DescriptiveLinkKey>0</m:DescriptiveLinkKey>
            </m:DeleteItemResponseMessage>
        </m:ResponseMessages>"#;

        #[derive(Debug)]
        struct Indexed(usize);
        impl ResponseHandler for Indexed {}

        let mut reader = EwsXmlReader::new(xml);
        let collection =
            ServiceResponseCollection::load_from_xml(&mut reader, "DeleteItemResponseMessage", Indexed)
                .unwrap();
        assert!(reader.is_end_element_named(XmlNamespace::Messages, "ResponseMessages"));
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.overall_result(), ServiceResult::Error);

        let indexes: Vec<usize> = collection.iter().map(|r| r.handler.0).collect();
        assert_eq!(indexes, vec![0, 1]);
        assert_eq!(
            collection[1].response.error_code(),
            ServiceError::ErrorItemNotFound
        );
    }
}
